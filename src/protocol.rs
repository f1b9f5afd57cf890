//! Line protocol spoken between the game engine and the agents.
//!
//! One message per line, fields separated by `;`, every line terminated by a
//! single `\n`:
//!
//! ```text
//! START;South
//! CHANGE;3;7,7,7,7,7,7,7,0,7,7,0,8,8,8,8,1;OPP
//! CHANGE;SWAP;<board>;YOU
//! MOVE;3
//! SWAP
//! END
//! ```
//!
//! Board snapshots list the North holes, the North store, the South holes and
//! the South store, in that order.

use crate::error::ProtocolError;
use crate::game::{Action, Board, Side};

/// Whose turn follows a `CHANGE` message, from the receiver's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Turn {
    You,
    Opp,
    End,
}

impl Turn {
    fn label(self) -> &'static str {
        match self {
            Turn::You => "YOU",
            Turn::Opp => "OPP",
            Turn::End => "END",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Assigns a side to the receiving agent.
    Start(Side),
    /// Reports the action just taken, the full board and who moves next.
    Change {
        action: Action,
        board: Board,
        turn: Turn,
    },
    /// Hole chosen by an agent.
    Move(usize),
    /// An agent invokes the pie rule.
    Swap,
    /// The match is over.
    End,
}

fn invalid(msg: impl Into<String>) -> ProtocolError {
    ProtocolError::InvalidMessage(msg.into())
}

/// Non-negative decimal integer in canonical form: digits only, no leading zeros.
fn parse_count<T: std::str::FromStr>(field: &str, what: &str) -> Result<T, ProtocolError> {
    if field.is_empty()
        || !field.bytes().all(|b| b.is_ascii_digit())
        || (field.len() > 1 && field.starts_with('0'))
    {
        return Err(invalid(format!("illegal value for {what}: {field:?}")));
    }
    field
        .parse()
        .map_err(|_| invalid(format!("illegal value for {what}: {field:?}")))
}

fn expect_fields(fields: &[&str], count: usize, kind: &str) -> Result<(), ProtocolError> {
    if fields.len() != count {
        return Err(invalid(format!(
            "{kind} message needs {count} fields, got {}",
            fields.len()
        )));
    }
    Ok(())
}

impl Message {
    /// Wire form, including the trailing newline.
    pub fn encode(&self) -> String {
        match self {
            Message::Start(side) => format!("START;{}\n", side.name()),
            Message::Change {
                action,
                board,
                turn,
            } => {
                let mut line = String::from("CHANGE;");
                match action {
                    Action::Hole(hole) => line.push_str(&hole.to_string()),
                    Action::Swap => line.push_str("SWAP"),
                }
                line.push(';');
                for (i, seeds) in board.pits().iter().enumerate() {
                    if i > 0 {
                        line.push(',');
                    }
                    line.push_str(&seeds.to_string());
                }
                line.push(';');
                line.push_str(turn.label());
                line.push('\n');
                line
            }
            Message::Move(hole) => format!("MOVE;{hole}\n"),
            Message::Swap => "SWAP\n".to_string(),
            Message::End => "END\n".to_string(),
        }
    }

    /// Parse one line. `holes` is the board size expected in `CHANGE` messages.
    pub fn decode(line: &str, holes: usize) -> Result<Message, ProtocolError> {
        let body = line
            .strip_suffix('\n')
            .ok_or_else(|| invalid("message not terminated with 0x0A character"))?;
        if body.contains('\n') {
            return Err(invalid("more than one line in message"));
        }

        let fields: Vec<&str> = body.split(';').collect();
        match fields[0] {
            "START" => {
                expect_fields(&fields, 2, "START")?;
                match fields[1] {
                    "North" => Ok(Message::Start(Side::North)),
                    "South" => Ok(Message::Start(Side::South)),
                    other => Err(invalid(format!("illegal position parameter: {other:?}"))),
                }
            }
            "CHANGE" => {
                expect_fields(&fields, 4, "CHANGE")?;
                let action = match fields[1] {
                    "SWAP" => Action::Swap,
                    hole => Action::Hole(parse_count(hole, "move parameter")?),
                };
                let board = decode_board(fields[2], holes)?;
                let turn = match fields[3] {
                    "YOU" => Turn::You,
                    "OPP" => Turn::Opp,
                    "END" => Turn::End,
                    other => return Err(invalid(format!("illegal value for turn parameter: {other:?}"))),
                };
                Ok(Message::Change {
                    action,
                    board,
                    turn,
                })
            }
            "MOVE" => {
                expect_fields(&fields, 2, "MOVE")?;
                Ok(Message::Move(parse_count(fields[1], "move parameter")?))
            }
            "SWAP" => {
                expect_fields(&fields, 1, "SWAP")?;
                Ok(Message::Swap)
            }
            "END" => {
                expect_fields(&fields, 1, "END")?;
                Ok(Message::End)
            }
            _ => Err(invalid("could not determine message type")),
        }
    }
}

fn decode_board(field: &str, holes: usize) -> Result<Board, ProtocolError> {
    let parts: Vec<&str> = field.split(',').collect();
    let expected = 2 * (holes + 1);
    if parts.len() != expected {
        return Err(invalid(format!(
            "board dimensions in message ({} entries) are not as expected ({expected} entries)",
            parts.len()
        )));
    }
    let pits = parts
        .iter()
        .map(|part| parse_count::<u32>(part, "seed count"))
        .collect::<Result<Vec<_>, _>>()?;
    Board::from_pits(holes, pits).map_err(|e| invalid(e.to_string()))
}
