use crate::error::{Result, StoreError};
use rusqlite::{Connection, OptionalExtension, Transaction};

const MIGRATIONS: &[(&str, &str)] = &[(
    "001_init.sql",
    include_str!("../migrations/001_init.sql"),
)];

pub fn run_migrations(conn: &mut Connection) -> Result<()> {
    let tx = conn.transaction()?;
    ensure_schema_table(&tx)?;
    let current = current_version(&tx)?;
    check_known(current)?;

    for (index, (_name, sql)) in MIGRATIONS.iter().enumerate() {
        let version = (index + 1) as i64;
        if current >= version {
            continue;
        }
        tx.execute_batch(sql)?;
        set_version(&tx, version)?;
    }

    tx.commit()?;
    Ok(())
}

/// Version of an existing store file, for read-only loads.
pub fn schema_version(conn: &Connection) -> Result<i64> {
    let version: Option<i64> = conn
        .query_row("SELECT version FROM fiches_schema LIMIT 1;", [], |row| {
            row.get(0)
        })
        .optional()?;
    let version = version.ok_or_else(|| StoreError::Migration("missing schema row".to_string()))?;
    check_known(version)?;
    Ok(version)
}

fn check_known(version: i64) -> Result<()> {
    if version > MIGRATIONS.len() as i64 {
        return Err(StoreError::Migration(format!(
            "store version {} newer than available migrations {}",
            version,
            MIGRATIONS.len()
        )));
    }
    Ok(())
}

fn ensure_schema_table(tx: &Transaction<'_>) -> Result<()> {
    tx.execute_batch("CREATE TABLE IF NOT EXISTS fiches_schema (version INTEGER NOT NULL);")?;

    let existing: Option<i64> = tx
        .query_row("SELECT version FROM fiches_schema LIMIT 1;", [], |row| {
            row.get(0)
        })
        .optional()?;

    if existing.is_none() {
        tx.execute("INSERT INTO fiches_schema (version) VALUES (0);", [])?;
    }

    Ok(())
}

fn current_version(tx: &Transaction<'_>) -> Result<i64> {
    let version: i64 = tx.query_row("SELECT version FROM fiches_schema LIMIT 1;", [], |row| {
        row.get(0)
    })?;
    Ok(version)
}

fn set_version(tx: &Transaction<'_>, version: i64) -> Result<()> {
    let updated = tx.execute("UPDATE fiches_schema SET version = ?1;", [version])?;
    if updated != 1 {
        return Err(StoreError::Migration(format!(
            "expected single schema row, updated {}",
            updated
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{run_migrations, schema_version, MIGRATIONS};
    use crate::db;

    #[test]
    fn migrations_are_idempotent() {
        let mut conn = db::open_in_memory().expect("open");
        run_migrations(&mut conn).expect("first run");
        run_migrations(&mut conn).expect("second run");
        assert_eq!(
            schema_version(&conn).expect("version"),
            MIGRATIONS.len() as i64
        );
    }

    #[test]
    fn newer_store_is_rejected() {
        let mut conn = db::open_in_memory().expect("open");
        run_migrations(&mut conn).expect("migrate");
        conn.execute("UPDATE fiches_schema SET version = 99;", [])
            .expect("bump version");
        assert!(schema_version(&conn).is_err());
        assert!(run_migrations(&mut conn).is_err());
    }
}
