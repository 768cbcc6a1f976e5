mod command_input;
mod input;
mod key_result;
mod prompt;

pub use command_input::{CommandEvent, CommandInput};
pub use input::{InputResult, TextInput};
pub use key_result::KeyResult;
pub use prompt::{draw_prompt, input_line};
