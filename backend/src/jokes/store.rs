//! `jokes` table: schema and upsert keyed by the upstream joke id.

use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use crate::error::LoadResult;
use crate::models::Joke;
use crate::storage::open_database;

const JOKES_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS jokes (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        joke_id INTEGER NOT NULL UNIQUE,
        category TEXT NOT NULL,
        type TEXT NOT NULL,
        joke TEXT,
        setup TEXT,
        delivery TEXT,
        flag_nsfw BOOLEAN DEFAULT 0,
        flag_political BOOLEAN DEFAULT 0,
        flag_sexist BOOLEAN DEFAULT 0,
        safe BOOLEAN DEFAULT 1,
        lang TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS ix_jokes_joke_id ON jokes (joke_id);
";

/// Create the `jokes` table if it is missing.
pub fn ensure_schema(conn: &Connection) -> LoadResult<()> {
    conn.execute_batch(JOKES_SCHEMA)?;
    Ok(())
}

/// Insert new jokes and overwrite existing ones, in one transaction.
///
/// Returns `(inserted, updated)`.
pub fn upsert_jokes(conn: &mut Connection, jokes: &[Joke]) -> LoadResult<(usize, usize)> {
    ensure_schema(conn)?;

    let tx = conn.transaction()?;
    let mut inserted = 0;
    let mut updated = 0;

    {
        let mut exists = tx.prepare("SELECT id FROM jokes WHERE joke_id = ?1")?;
        let mut update = tx.prepare(
            "UPDATE jokes SET category = ?2, type = ?3, joke = ?4, setup = ?5, delivery = ?6,
                 flag_nsfw = ?7, flag_political = ?8, flag_sexist = ?9, safe = ?10, lang = ?11
             WHERE joke_id = ?1",
        )?;
        let mut insert = tx.prepare(
            "INSERT INTO jokes (joke_id, category, type, joke, setup, delivery,
                 flag_nsfw, flag_political, flag_sexist, safe, lang)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        )?;

        for joke in jokes {
            let values = params![
                joke.joke_id,
                joke.category,
                joke.kind,
                joke.joke,
                joke.setup,
                joke.delivery,
                joke.flag_nsfw,
                joke.flag_political,
                joke.flag_sexist,
                joke.safe,
                joke.lang,
            ];

            let existing: Option<i64> = exists
                .query_row(params![joke.joke_id], |row| row.get(0))
                .optional()?;

            if existing.is_some() {
                update.execute(values)?;
                updated += 1;
            } else {
                insert.execute(values)?;
                inserted += 1;
            }
        }
    }

    tx.commit()?;
    Ok((inserted, updated))
}

/// Open the database at `database_path` and upsert into it.
pub fn upsert_jokes_at(database_path: &Path, jokes: &[Joke]) -> LoadResult<(usize, usize)> {
    let mut conn = open_database(database_path)?;
    upsert_jokes(&mut conn, jokes)
}

/// Every stored joke, ordered by upstream id.
pub fn fetch_stored_jokes(conn: &Connection) -> LoadResult<Vec<Joke>> {
    let mut stmt = conn.prepare(
        "SELECT joke_id, category, type, flag_nsfw, flag_political, flag_sexist, safe, lang,
                joke, setup, delivery
         FROM jokes ORDER BY joke_id",
    )?;

    let jokes = stmt
        .query_map([], |row| {
            Ok(Joke {
                joke_id: row.get(0)?,
                category: row.get(1)?,
                kind: row.get(2)?,
                flag_nsfw: row.get(3)?,
                flag_political: row.get(4)?,
                flag_sexist: row.get(5)?,
                safe: row.get(6)?,
                lang: row.get(7)?,
                joke: row.get(8)?,
                setup: row.get(9)?,
                delivery: row.get(10)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(jokes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn joke(id: i64, text: &str) -> Joke {
        Joke {
            joke_id: id,
            category: "Programming".into(),
            kind: "single".into(),
            flag_nsfw: false,
            flag_political: false,
            flag_sexist: false,
            safe: true,
            lang: "en".into(),
            joke: Some(text.into()),
            setup: None,
            delivery: None,
        }
    }

    #[test]
    fn test_insert_then_update() {
        let mut conn = Connection::open_in_memory().unwrap();

        let (inserted, updated) = upsert_jokes(&mut conn, &[joke(1, "a"), joke(2, "b")]).unwrap();
        assert_eq!((inserted, updated), (2, 0));

        let (inserted, updated) = upsert_jokes(&mut conn, &[joke(2, "b2"), joke(3, "c")]).unwrap();
        assert_eq!((inserted, updated), (1, 1));

        let stored = fetch_stored_jokes(&conn).unwrap();
        assert_eq!(stored.len(), 3);
        assert_eq!(stored[1].joke.as_deref(), Some("b2"));
    }

    #[test]
    fn test_update_overwrites_every_column() {
        let mut conn = Connection::open_in_memory().unwrap();
        upsert_jokes(&mut conn, &[joke(9, "single")]).unwrap();

        let mut twopart = joke(9, "");
        twopart.kind = "twopart".into();
        twopart.joke = None;
        twopart.setup = Some("setup".into());
        twopart.delivery = Some("delivery".into());
        twopart.flag_political = true;
        upsert_jokes(&mut conn, &[twopart.clone()]).unwrap();

        let stored = fetch_stored_jokes(&conn).unwrap();
        assert_eq!(stored, vec![twopart]);
    }

    #[test]
    fn test_upsert_at_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("jokes.db");

        let counts = upsert_jokes_at(&path, &[joke(1, "a")]).unwrap();
        assert_eq!(counts, (1, 0));
        assert!(path.exists());
    }
}
