use std::io::{self, Write};

use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

use crate::cli::ExplainArgs;
use crate::db::{load_synonym_entries, load_vendor_by_id, open_existing, require_vendors_table};
use crate::error::CkwError;
use crate::keywords::{CURRENT_CKW_VERSION, KeywordSources, Thesaurus, needs_update};

pub fn run(args: ExplainArgs) -> Result<()> {
    info!(db_path = %args.db_path.display(), id = args.id, "explain requested");

    let connection = open_existing(&args.db_path, true)?;
    require_vendors_table(&connection, &args.db_path)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    explain_vendor(&connection, args.id, &mut out)
}

fn explain_vendor(connection: &Connection, id: i64, out: &mut dyn Write) -> Result<()> {
    let record = load_vendor_by_id(connection, id)?.ok_or(CkwError::RecordNotFound { id })?;
    let thesaurus = Thesaurus::from_entries(&load_synonym_entries(connection)?);

    let sources = KeywordSources::extract(&record, &thesaurus);
    let computed = sources.compose().join(" ");

    writeln!(
        out,
        "vendor {id}: {}",
        record.business_name.as_deref().unwrap_or_default()
    )?;
    for (label, tokens) in sources.labeled() {
        writeln!(out, "  {label:<18} {}", tokens.join(" | "))?;
    }
    writeln!(out, "  {:<18} {computed}", "computed")?;
    writeln!(
        out,
        "  {:<18} {}",
        "stored",
        record.computed_keywords.as_deref().unwrap_or_default()
    )?;
    writeln!(
        out,
        "  {:<18} {} (current {CURRENT_CKW_VERSION})",
        "ckw_version",
        record.ckw_version.as_deref().unwrap_or("-")
    )?;

    let verdict = if record.ckw_locked {
        "no (locked)"
    } else if needs_update(&record, &computed) {
        "yes"
    } else {
        "no (unchanged)"
    };
    writeln!(out, "  {:<18} {verdict}", "would rewrite")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use super::*;

    fn explain_db() -> Connection {
        let connection = Connection::open_in_memory().expect("in-memory DB should open");
        connection
            .execute_batch(
                "
                CREATE TABLE vendors (
                  id INTEGER PRIMARY KEY,
                  business_name TEXT,
                  category TEXT,
                  phone TEXT,
                  email TEXT,
                  computed_keywords TEXT,
                  ckw_locked INTEGER DEFAULT 0,
                  ckw_version TEXT
                );
                CREATE TABLE ckw_seeds (id INTEGER PRIMARY KEY, kind TEXT, term TEXT, syn TEXT);
                INSERT INTO ckw_seeds(kind, term, syn) VALUES ('category', 'heating', 'hvac');
                INSERT INTO vendors(id, business_name, category, phone, email, ckw_locked)
                  VALUES (1, 'Cool Air', 'HVAC', '555 1212', 'info@coolair.com', 0);
                INSERT INTO vendors(id, business_name, category, ckw_locked, computed_keywords)
                  VALUES (2, 'Locked Shop', 'misc', 1, 'frozen');
                ",
            )
            .expect("schema should load");
        connection
    }

    fn explain(connection: &Connection, id: i64) -> Result<String> {
        let mut out = Vec::new();
        explain_vendor(connection, id, &mut out)?;
        Ok(String::from_utf8(out).expect("output should be utf-8"))
    }

    #[test]
    fn explain_lists_each_source_and_the_composed_result() {
        let connection = explain_db();

        let output = explain(&connection, 1).expect("explain should succeed");

        assert!(output.starts_with("vendor 1: Cool Air\n"));
        assert!(output.contains("  category           hvac | heating\n"));
        assert!(output.contains("  email              info | coolair | coolaircom | coolair.com\n"));
        assert!(output.contains("  phone              5551212 | 1212\n"));
        assert!(output.contains(
            "  computed           hvac heating cool air cool air coolair info coolaircom coolair.com 5551212 1212\n"
        ));
        assert!(output.contains("  would rewrite      yes\n"));
    }

    #[test]
    fn explain_reports_locked_rows() {
        let connection = explain_db();

        let output = explain(&connection, 2).expect("explain should succeed");

        assert!(output.contains("  stored             frozen\n"));
        assert!(output.contains("  would rewrite      no (locked)\n"));
    }

    #[test]
    fn explain_unknown_id_is_an_error() {
        let connection = explain_db();

        let err = explain(&connection, 404).expect_err("unknown id should fail");
        assert!(matches!(
            err.downcast_ref::<CkwError>(),
            Some(CkwError::RecordNotFound { id: 404 })
        ));
    }
}
