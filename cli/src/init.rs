//! Shell integration scripts printed by `dongle init`.

use clap::ValueEnum;

const POSIX: &str = include_str!("shell/posix.sh");
const FISH: &str = include_str!("shell/dongle.fish");

/// Shell to generate integration for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
}

impl Shell {
    fn name(self) -> &'static str {
        match self {
            Self::Bash => "bash",
            Self::Zsh => "zsh",
            Self::Fish => "fish",
        }
    }
}

/// The script defining a `command` function that jumps to the picked
/// directory.
pub fn script(shell: Shell, command: &str) -> String {
    let template = match shell {
        Shell::Bash | Shell::Zsh => POSIX,
        Shell::Fish => FISH,
    };
    template
        .replace("{{shell}}", shell.name())
        .replace("{{cmd}}", command)
}
