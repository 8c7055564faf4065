use dialoguer::theme::ColorfulTheme;
use dialoguer::Select;
use engine_logging::engine_warn;
use glossa_core::UserChoice;
use glossa_engine::CapacityPrompt;

/// Asks on the terminal how to make room in a full upload store.
pub struct TerminalPrompt;

impl CapacityPrompt for TerminalPrompt {
    fn decide(&self, limit: u32, oldest_name: Option<&str>) -> UserChoice {
        let items = [
            format!(
                "Delete the oldest file ({}) and store the new one",
                oldest_name.unwrap_or("unknown")
            ),
            "Keep every file and store the new one anyway".to_string(),
        ];
        let prompt = format!("The temporary upload area is full ({limit} files)");

        // Called from inside the runtime; the terminal read blocks this worker.
        let selection = tokio::task::block_in_place(|| {
            Select::with_theme(&ColorfulTheme::default())
                .with_prompt(prompt)
                .items(&items)
                .default(0)
                .interact()
        });
        match selection {
            Ok(0) => UserChoice::Evict,
            Ok(_) => UserChoice::Keep,
            Err(err) => {
                engine_warn!("capacity prompt failed, keeping existing files: {}", err);
                UserChoice::Keep
            }
        }
    }
}
