use socialwall_common::model::{Id, post::PostMarker};
use std::{num::ParseIntError, path::PathBuf, str::FromStr};
use thiserror::Error;

pub const HELP: &str = "\
Commands:
  feed                 reload and show the wall
  name <text>          set your display name
  message <text>       replace the message
  type <text>          type onto the end of the message
  image <path>         attach an image to the post
  clear-image          remove the attached image
  post                 share the post
  avatar <path>        change your profile picture, or pick one during setup
  setup-complete       finish profile setup with the chosen avatar
  setup-skip           finish profile setup without an avatar
  edit <id>            start editing a post
  edit-text <text>     replace the text being edited
  save                 save the edit
  cancel               stop editing
  delete <id>          delete a post
  help                 show this help
  quit                 leave";

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub enum Command {
    Feed,
    Name(String),
    Message(String),
    Type(String),
    Image(PathBuf),
    ClearImage,
    Post,
    Avatar(PathBuf),
    SetupComplete,
    SetupSkip,
    Edit(Id<PostMarker>),
    EditText(String),
    Save,
    Cancel,
    Delete(Id<PostMarker>),
    Help,
    Quit,
}

#[derive(Clone, Eq, PartialEq, Debug, Error)]
pub enum CommandParseError {
    #[error("Empty command, type `help` for a list of commands")]
    Empty,
    #[error("Unknown command `{0}`, type `help` for a list of commands")]
    Unknown(String),
    #[error("`{0}` needs an argument")]
    MissingArgument(&'static str),
    #[error("`{0}` takes no argument")]
    UnexpectedArgument(&'static str),
    #[error("Invalid post id: {0}")]
    InvalidId(#[from] ParseIntError),
}

impl FromStr for Command {
    type Err = CommandParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim_start();
        let (name, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        // Text arguments keep inner and trailing whitespace; trimming
        // happens when the post is validated.
        let arg = rest.trim_start();

        let command = match name {
            "" => return Err(CommandParseError::Empty),
            "feed" => no_arg("feed", arg, Command::Feed)?,
            "name" => Command::Name(arg.to_owned()),
            "message" => Command::Message(arg.to_owned()),
            "type" => Command::Type(arg.to_owned()),
            "image" => Command::Image(path_arg("image", arg)?),
            "clear-image" => no_arg("clear-image", arg, Command::ClearImage)?,
            "post" => no_arg("post", arg, Command::Post)?,
            "avatar" => Command::Avatar(path_arg("avatar", arg)?),
            "setup-complete" => no_arg("setup-complete", arg, Command::SetupComplete)?,
            "setup-skip" => no_arg("setup-skip", arg, Command::SetupSkip)?,
            "edit" => Command::Edit(id_arg("edit", arg)?),
            "edit-text" => Command::EditText(arg.to_owned()),
            "save" => no_arg("save", arg, Command::Save)?,
            "cancel" => no_arg("cancel", arg, Command::Cancel)?,
            "delete" => Command::Delete(id_arg("delete", arg)?),
            "help" => no_arg("help", arg, Command::Help)?,
            "quit" | "exit" => no_arg("quit", arg, Command::Quit)?,
            other => return Err(CommandParseError::Unknown(other.to_owned())),
        };

        Ok(command)
    }
}

fn no_arg(name: &'static str, arg: &str, command: Command) -> Result<Command, CommandParseError> {
    if arg.trim().is_empty() {
        Ok(command)
    } else {
        Err(CommandParseError::UnexpectedArgument(name))
    }
}

fn path_arg(name: &'static str, arg: &str) -> Result<PathBuf, CommandParseError> {
    let arg = arg.trim();
    if arg.is_empty() {
        Err(CommandParseError::MissingArgument(name))
    } else {
        Ok(PathBuf::from(arg))
    }
}

fn id_arg(name: &'static str, arg: &str) -> Result<Id<PostMarker>, CommandParseError> {
    if arg.trim().is_empty() {
        return Err(CommandParseError::MissingArgument(name));
    }
    Ok(arg.parse()?)
}
