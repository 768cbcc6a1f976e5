/// Dashboard `:` commands and autocomplete

#[derive(Debug, Clone)]
pub struct Command {
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub description: &'static str,
}

pub const COMMANDS: &[Command] = &[
  Command {
    name: "prayers",
    aliases: &["p", "times", "salah"],
    description: "Prayer times and countdown",
  },
  Command {
    name: "journal",
    aliases: &["j", "tracker", "ibadah"],
    description: "Daily ibadah journal",
  },
  Command {
    name: "qibla",
    aliases: &["k", "direction"],
    description: "Qibla direction",
  },
  Command {
    name: "cache",
    aliases: &["c", "offline"],
    description: "Offline cache buckets",
  },
  Command {
    name: "ask",
    aliases: &["a", "assistant", "chat"],
    description: "Ask the assistant",
  },
  Command {
    name: "quit",
    aliases: &["q", "exit"],
    description: "Exit nuswally",
  },
];

/// Get autocomplete suggestions for a given input
pub fn get_suggestions(input: &str) -> Vec<&'static Command> {
  let input_lower = input.trim().to_lowercase();

  if input_lower.is_empty() {
    return COMMANDS.iter().collect();
  }

  let mut matches: Vec<(&Command, u32)> = Vec::new();

  for cmd in COMMANDS {
    let priority = if cmd.name == input_lower {
      0
    } else if cmd.aliases.contains(&input_lower.as_str()) {
      1
    } else if cmd.name.starts_with(&input_lower) {
      2
    } else if cmd.aliases.iter().any(|a| a.starts_with(&input_lower)) {
      3
    } else if cmd.name.contains(&input_lower) {
      4
    } else if cmd.aliases.iter().any(|a| a.contains(&input_lower)) {
      5
    } else {
      continue;
    };
    matches.push((cmd, priority));
  }

  // Stable, so equal priorities keep table order
  matches.sort_by_key(|(_, priority)| *priority);

  matches.into_iter().map(|(cmd, _)| cmd).collect()
}
