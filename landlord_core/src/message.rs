use crate::state::SeatId;
use serde::{Deserialize, Serialize};

// --- 服务器 -> 客户端 的消息 ---
// 每条消息序列化成一行 JSON：`{"msg_type": ..., "content": ..., "sender": ...}`

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// 普通提示
    Message,
    /// 命令被拒绝
    Error,
    /// 自己的身份和手牌，内容是 `<身份>_<手牌>`
    PlayerStatus,
    Info,
    /// 其他玩家的聊天
    Chat,
    /// 房间状态，内容是 `<阶段>_<玩家列表>`
    RoomInfo,
    /// 服务器要关闭这个连接
    Stop,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Message {
    #[serde(rename = "msg_type")]
    pub kind: MessageKind,
    pub content: String,
    /// 接收者的昵称，投递时由服务器填上
    #[serde(default)]
    pub sender: String,
}

impl Message {
    pub fn new(kind: MessageKind, content: impl Into<String>) -> Message {
        Message { kind, content: content.into(), sender: String::new() }
    }

    pub fn text(content: impl Into<String>) -> Message {
        Message::new(MessageKind::Message, content)
    }

    pub fn error(content: impl Into<String>) -> Message {
        Message::new(MessageKind::Error, content)
    }

    pub fn info(content: impl Into<String>) -> Message {
        Message::new(MessageKind::Info, content)
    }

    pub fn stop(content: impl Into<String>) -> Message {
        Message::new(MessageKind::Stop, content)
    }
}

// --- 客户端 -> 服务器 的命令 ---

pub const HELP: &str = "available commands:
   /commands: list available commands
   /list: list online players
   /ready: be ready for the game
   /view: view your current cards
   /use <card1> <card2> ...: use the cards you selected
   /pass: pass your current turn
   /quit: quit the game";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandId {
    ListCommands,
    ListPlayers,
    Quit,
    Ready,
    ViewCards,
    UseCards,
    Pass,
    EmptyLine,
    Chat,
    Unknown,
}

/// 解析后的一行输入
///
/// `args` 是命令后面的参数。`Chat` 时是整行文字，`Unknown` 时第一个元素是没认出来的命令。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub id: CommandId,
    pub sender: SeatId,
    pub args: Vec<String>,
}

impl Command {
    pub fn parse(sender: SeatId, line: &str) -> Command {
        let line = line.trim_matches(|c| c == '\r' || c == '\n' || c == ' ');
        if !line.is_empty() && !line.starts_with('/') {
            return Command { id: CommandId::Chat, sender, args: vec![line.to_string()] };
        }

        let mut tokens = line.split_whitespace();
        let Some(word) = tokens.next() else {
            return Command { id: CommandId::EmptyLine, sender, args: Vec::new() };
        };
        let id = match word {
            "/commands" => CommandId::ListCommands,
            "/list" => CommandId::ListPlayers,
            "/quit" => CommandId::Quit,
            "/ready" => CommandId::Ready,
            "/view" => CommandId::ViewCards,
            "/use" => CommandId::UseCards,
            "/pass" => CommandId::Pass,
            _ => {
                let args = std::iter::once(word).chain(tokens).map(String::from).collect();
                return Command { id: CommandId::Unknown, sender, args };
            }
        };
        Command { id, sender, args: tokens.map(String::from).collect() }
    }

    /// 连接断开时代替玩家发出的退出命令
    pub fn quit(sender: SeatId) -> Command {
        Command { id: CommandId::Quit, sender, args: Vec::new() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_parse_slash_commands() {
        let id = Uuid::new_v4();
        let cmd = Command::parse(id, "/use 3 3 joker\r\n");
        assert_eq!(cmd.id, CommandId::UseCards);
        assert_eq!(cmd.sender, id);
        assert_eq!(cmd.args, ["3", "3", "joker"]);

        assert_eq!(Command::parse(id, "/ready").id, CommandId::Ready);
        assert_eq!(Command::parse(id, "/list").id, CommandId::ListPlayers);
        assert_eq!(Command::parse(id, "/pass ").id, CommandId::Pass);
    }

    #[test]
    fn test_parse_chat_empty_and_unknown() {
        let id = Uuid::new_v4();
        let chat = Command::parse(id, " hello there \n");
        assert_eq!(chat.id, CommandId::Chat);
        assert_eq!(chat.args, ["hello there"]);

        assert_eq!(Command::parse(id, "\r\n").id, CommandId::EmptyLine);

        let unknown = Command::parse(id, "/dance now");
        assert_eq!(unknown.id, CommandId::Unknown);
        assert_eq!(unknown.args[0], "/dance");
    }

    #[test]
    fn test_message_wire_format() {
        let mut msg = Message::new(MessageKind::RoomInfo, "waiting_alice");
        msg.sender = "bob".into();
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"msg_type":"RoomInfo","content":"waiting_alice","sender":"bob"}"#);

        let back: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }
}
