use covenantsql_http::{ConnectOptions, Connection, Value};

fn main() -> anyhow::Result<()> {
    let options = ConnectOptions::from_env()?;
    let conn = Connection::open(options)?;

    let mut stmt = conn.create_statement()?;
    stmt.execute_update(
        "CREATE TABLE IF NOT EXISTS `users` (
            `id` INTEGER PRIMARY KEY AUTOINCREMENT,
            `created_at` DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
            `email` VARCHAR(255) NOT NULL
        )",
        (),
    )?;

    stmt.execute_update(
        "INSERT INTO `users` (`email`) VALUES (?)",
        [Value::text("kit@example.com")],
    )?;
    println!("inserted {} row(s)", stmt.update_count());

    let cursor = stmt.execute_query("SELECT * FROM `users`", ())?;
    while cursor.advance()? {
        println!(
            "id={:?} email={:?} created_at={:?}",
            cursor.get("id")?,
            cursor.get("email")?,
            cursor.get("created_at")?
        );
    }

    stmt.close();
    Ok(())
}
