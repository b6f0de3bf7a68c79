//! Line commands of the terminal view

use slotbook_core::{ActorId, ReservationKind, SlotKey};

pub const HELP: &str = "\
Commands:
  show                          list teams and slots
  reload                        fetch the catalog again
  book <team> <slot>            select a slot to book
  release <team> <slot>         select your slot to release
  assign <team> <slot> <holder> select a seat to assign
  confirm                       send the selection to the server
  cancel                        drop the selection
  help                          show this text
  quit                          leave";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Show,
    Reload,
    Select { key: SlotKey, kind: ReservationKind },
    Confirm,
    Cancel,
    Help,
    Quit,
}

/// Parse one input line. Blank lines yield `Ok(None)`.
pub fn parse(line: &str) -> Result<Option<Command>, String> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let Some((&verb, args)) = words.split_first() else {
        return Ok(None);
    };

    let command = match (verb.to_ascii_lowercase().as_str(), args) {
        ("show" | "ls", []) => Command::Show,
        ("reload", []) => Command::Reload,
        ("book", [team, slot]) => Command::Select {
            key: SlotKey::new(*team, *slot),
            kind: ReservationKind::Book,
        },
        ("release", [team, slot]) => Command::Select {
            key: SlotKey::new(*team, *slot),
            kind: ReservationKind::Release,
        },
        ("assign", [team, slot, holder]) => Command::Select {
            key: SlotKey::new(*team, *slot),
            kind: ReservationKind::Assign {
                holder: ActorId::new(*holder),
            },
        },
        ("confirm" | "ok", []) => Command::Confirm,
        ("cancel", []) => Command::Cancel,
        ("help" | "?", []) => Command::Help,
        ("quit" | "exit", []) => Command::Quit,
        ("show" | "ls" | "reload" | "book" | "release" | "assign" | "confirm" | "ok" | "cancel"
        | "help" | "?" | "quit" | "exit", _) => {
            return Err(format!("Wrong arguments for '{}', try 'help'", verb));
        }
        _ => return Err(format!("Unknown command '{}', try 'help'", verb)),
    };

    Ok(Some(command))
}
