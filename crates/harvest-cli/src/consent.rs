use std::io::IsTerminal;

use dialoguer::Confirm;
use harvest_scraper::{AutoConsent, ImportConsent};

/// Asks on the terminal before reading the browser cookie jar.
struct PromptConsent;

impl ImportConsent for PromptConsent {
    fn confirm_import(&self) -> bool {
        Confirm::new()
            .with_prompt("No stored credentials. Import session cookies from Firefox?")
            .default(false)
            .interact()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "import prompt failed; not importing");
                false
            })
    }
}

/// `--yes` and `--no-import` answer up front; otherwise prompt when stdin is
/// a terminal and decline when it is not.
pub(crate) fn consent_for(yes: bool, no_import: bool) -> Box<dyn ImportConsent> {
    if yes {
        Box::new(AutoConsent(true))
    } else if no_import || !std::io::stdin().is_terminal() {
        Box::new(AutoConsent(false))
    } else {
        Box::new(PromptConsent)
    }
}
