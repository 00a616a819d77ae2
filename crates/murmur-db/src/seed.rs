use anyhow::Result;
use tracing::info;

use crate::Database;
use crate::queries::NewMessage;

impl Database {
    /// Wipe all rows and load a small demo dataset: users Alice and Bob, a
    /// `general` channel and one welcome message from Alice.
    pub fn seed_demo(&self) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute_batch(
                "
                DELETE FROM messages;
                DELETE FROM channels;
                DELETE FROM users;
                ",
            )?;
            tx.commit()?;
            Ok(())
        })?;

        let alice = self.create_user("Alice")?;
        self.create_user("Bob")?;
        let general = self.create_channel("general")?;
        self.insert_message(&NewMessage {
            channel_id: general.id,
            sender_id: alice.id,
            body: Some("Welcome to the general channel!".into()),
            ..Default::default()
        })?;

        info!("Seeded demo data");
        Ok(())
    }
}
