use dialoguer::Input;
use std::io::{self, IsTerminal};

/// Ask the user to type 'yes' before doing something destructive.
///
/// Anything other than 'yes' declines. When stdin is not a terminal there is
/// nobody to ask, so this declines without prompting.
pub fn confirm_yes(prompt: &str) -> Result<bool, dialoguer::Error> {
    if !io::stdin().is_terminal() {
        return Ok(false);
    }

    let prompt = format!("{} Type 'yes' to continue", prompt);
    let result: String = Input::new()
        .with_prompt(&prompt)
        .allow_empty(true)
        .interact_text()?;

    Ok(is_yes(&result))
}

fn is_yes(answer: &str) -> bool {
    answer.trim() == "yes"
}

/// Show only the first few characters of a token.
pub fn mask_token(token: &str) -> String {
    const VISIBLE: usize = 4;
    let count = token.chars().count();
    if count == 0 {
        return String::new();
    }
    if count <= VISIBLE * 2 {
        return "*".repeat(count);
    }
    let head: String = token.chars().take(VISIBLE).collect();
    format!("{}{}", head, "*".repeat(count - VISIBLE))
}
