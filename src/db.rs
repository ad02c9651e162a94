//! Creates the application's database tables.

use rusqlite::Connection;

use crate::{
    Error, auth::create_user_table, settings::create_settings_table,
    transaction::create_transaction_table,
};

/// Create the tables for users, transactions and reminder settings.
///
/// Foreign key enforcement is switched on for `connection` so that deleting a
/// user removes their transactions and settings.
///
/// # Errors
/// Returns an error if any of the tables could not be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let transaction = connection.unchecked_transaction()?;

    create_user_table(&transaction)?;
    create_transaction_table(&transaction)?;
    create_settings_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

#[cfg(test)]
mod db_tests {
    use rusqlite::Connection;

    use super::initialize;

    #[test]
    fn initialize_is_idempotent() {
        let connection = Connection::open_in_memory().unwrap();

        initialize(&connection).unwrap();
        let result = initialize(&connection);

        assert_eq!(result, Ok(()));
    }

    #[test]
    fn enables_foreign_keys() {
        let connection = Connection::open_in_memory().unwrap();

        initialize(&connection).unwrap();

        let enabled: bool = connection
            .pragma_query_value(None, "foreign_keys", |row| row.get(0))
            .unwrap();
        assert!(enabled);
    }
}
