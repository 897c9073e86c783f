//! End-to-end passes over a Prisma-style migration.

use ddl_guard::{
    audit, realign, wrap, Config, ErrorCodes, MigrationFile, Pruner, StatementKind, Unresolved,
};
use pretty_assertions::assert_eq;

const INIT: &str = include_str!("fixtures/init_migration.sql");

fn lines(text: &str) -> Vec<String> {
    text.lines().map(str::to_string).collect()
}

#[test]
fn test_mixed_migration_wraps_only_unguarded() {
    let input = lines(INIT);
    let out = wrap(&input);

    assert_eq!(out.stats.count(StatementKind::Enum), 1);
    assert_eq!(out.stats.count(StatementKind::Table), 2);
    assert_eq!(out.stats.count(StatementKind::UniqueIndex), 1);
    assert_eq!(out.stats.count(StatementKind::Index), 0);
    assert_eq!(out.stats.already_wrapped, 2);
    assert!(out.stats.unresolved.is_empty());

    // 4 statements wrapped, 4 guard lines added to each
    assert_eq!(out.lines.len(), input.len() + 4 * 4);

    let again = wrap(&out.lines);
    assert_eq!(again.lines, out.lines);
}

#[test]
fn test_wrapped_table_block() {
    let out = wrap(&lines(INIT));
    let start = out
        .lines
        .iter()
        .position(|l| l.contains(r#"CREATE TABLE "User""#))
        .unwrap();

    assert_eq!(out.lines[start - 2], "-- CreateTable");
    assert_eq!(out.lines[start - 1], "DO $$ BEGIN");
    assert_eq!(
        &out.lines[start..start + 9],
        &[
            r#"    CREATE TABLE "User" ("#,
            r#"        "id" TEXT NOT NULL,"#,
            r#"        "email" TEXT NOT NULL,"#,
            r#"        "role" "Role" NOT NULL DEFAULT 'USER',"#,
            "",
            r#"        CONSTRAINT "User_pkey" PRIMARY KEY ("id")"#,
            "    );",
            "EXCEPTION",
            "    WHEN duplicate_table THEN null;",
        ]
    );
    assert_eq!(out.lines[start + 9], "END $$;");
}

#[test]
fn test_non_statement_lines_untouched() {
    let input = lines(INIT);
    let out = wrap(&input);
    let foreign_key = input.last().unwrap();
    assert_eq!(out.lines.last().unwrap(), foreign_key);

    let comments = |ls: &[String]| -> Vec<String> {
        ls.iter().filter(|l| l.starts_with("--")).cloned().collect()
    };
    assert_eq!(comments(&out.lines), comments(&input));
}

#[test]
fn test_full_pipeline_is_clean() {
    let input = lines(INIT);
    let before = audit(&input, &ErrorCodes::default());
    assert_eq!(before.unwrapped, 4);
    assert_eq!(before.mismatched_handlers.len(), 1);
    assert!(!before.is_clean());

    let wrapped = wrap(&input);
    let fixed = realign(&wrapped.lines, &ErrorCodes::default());
    assert_eq!(fixed.count(StatementKind::Index), 1);

    let after = audit(&fixed.lines, &ErrorCodes::default());
    assert!(after.is_clean());
    assert_eq!(after.guarded, 6);
}

#[test]
fn test_unterminated_statement_reported() {
    let mut input = lines(INIT);
    // cut the file inside the Task table
    let cut = input.iter().position(|l| l.contains(r#""tenantId" TEXT"#)).unwrap();
    input.truncate(cut + 1);

    let out = wrap(&input);
    assert_eq!(
        out.stats.unresolved,
        vec![Unresolved {
            kind: StatementKind::Table,
            name: "Task".to_string(),
            line: cut - 1,
        }]
    );
    assert_eq!(&out.lines[out.lines.len() - 3..], &input[input.len() - 3..]);
}

#[test]
fn test_file_round_trip_with_config() {
    let dir = tempfile::tempdir().unwrap();
    let migration_dir = dir.path().join("20240101120000_init");
    std::fs::create_dir(&migration_dir).unwrap();
    std::fs::write(migration_dir.join("migration.sql"), INIT).unwrap();

    let config: Config = toml::from_str(
        r#"
indent = 2
prune = ['^-- AddForeignKey$']
"#,
    )
    .unwrap();

    let path = MigrationFile::latest_in(dir.path()).unwrap();
    let file = MigrationFile::open(&path).unwrap();

    let wrapped = config.wrapper().wrap(file.lines());
    let pruned = config.pruner(&[]).unwrap().prune(&wrapped.lines);
    assert_eq!(pruned.removed.len(), 1);

    file.backup().unwrap();
    file.write(&pruned.lines).unwrap();

    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.ends_with('\n'));
    assert!(written.contains("  CREATE TABLE \"Task\" ("));
    assert!(!written.contains("-- AddForeignKey"));

    let reread = MigrationFile::open(&path).unwrap();
    assert!(wrap(reread.lines()).stats.is_noop());

    let backups = std::fs::read_dir(&migration_dir)
        .unwrap()
        .filter(|e| {
            e.as_ref()
                .unwrap()
                .file_name()
                .to_string_lossy()
                .ends_with(".bak")
        })
        .count();
    assert_eq!(backups, 1);
}

#[test]
fn test_pruner_rejects_bad_pattern() {
    assert!(Pruner::new(["[unclosed"]).is_err());
}
