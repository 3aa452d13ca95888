//! Implementation of the sounds command.

use anyhow::Result;

use crate::sounds;

pub fn handle_sounds_command(category: Option<&str>) -> Result<()> {
    log_version!();

    match category {
        Some(category) => {
            let entries = sounds::sounds_for_category(category);
            if entries.is_empty() {
                log_block_start!("No category '{category}'");
                log_indented!("Categories: {}", sounds::categories().join(", "));
                log_end!();
                return Ok(());
            }
            log_block_start!("{category}");
            for entry in entries {
                log_indented!("{} ({})", entry.display_name, entry.resource_key);
            }
        }
        None => {
            for category in sounds::categories() {
                log_block_start!("{category}");
                for entry in sounds::sounds_for_category(category) {
                    log_indented!("{} ({})", entry.display_name, entry.resource_key);
                }
            }
        }
    }
    log_end!();
    Ok(())
}
