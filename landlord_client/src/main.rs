use futures_util::{SinkExt, StreamExt};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message as WsMessage};
use url::Url;

use landlord_core::{Message, MessageKind};

const DEFAULT_URL: &str = "ws://127.0.0.1:25917/ws";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let url = Url::parse(&std::env::args().nth(1).unwrap_or_else(|| DEFAULT_URL.to_string()))?;

    println!("connecting to {}", url);
    let (ws_stream, _) = connect_async(url.as_str()).await?;
    println!("connected, please type your nickname");

    let (mut write, mut read) = ws_stream.split();

    // 启动一个任务来处理从服务器接收的消息，收到 Stop 就退出
    let mut reader = tokio::spawn(async move {
        while let Some(msg) = read.next().await {
            match msg {
                Ok(WsMessage::Text(text)) => match serde_json::from_str::<Message>(&text) {
                    Ok(message) => {
                        println!("{}", render(&message));
                        let _ = std::io::stdout().flush();
                        if message.kind == MessageKind::Stop {
                            break;
                        }
                    }
                    Err(e) => eprintln!("failed to decode message: {}", e),
                },
                Ok(WsMessage::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    eprintln!("connection error: {}", e);
                    break;
                }
            }
        }
    });

    // 主任务把每一行输入原样发给服务器
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = stdin.next_line() => {
                let line = line?.unwrap_or_else(|| "/quit".to_string());
                let quitting = line.trim() == "/quit";
                write.send(WsMessage::Text(line.into())).await?;
                if quitting {
                    break;
                }
            }
            _ = &mut reader => return Ok(()),
        }
    }

    let _ = reader.await;
    Ok(())
}

/// 把一条服务器消息变成终端里显示的文字
fn render(message: &Message) -> String {
    match message.kind {
        MessageKind::PlayerStatus => {
            let (role, hand) = message.content.split_once('_').unwrap_or(("", message.content.as_str()));
            format!("[{}] {}", role, strip_regions(hand))
        }
        MessageKind::RoomInfo => {
            let (state, players) = message.content.split_once('_').unwrap_or((message.content.as_str(), ""));
            format!("--- room: {} ---\n{}", state, players)
        }
        MessageKind::Chat => format!("  {}", message.content),
        _ => message.content.clone(),
    }
}

/// 去掉推荐出牌的标记：`["1"]♥5[""]` -> `*♥5`
fn strip_regions(hand: &str) -> String {
    let mut out = String::with_capacity(hand.len());
    let mut rest = hand;
    while let Some(start) = rest.find("[\"") {
        out.push_str(&rest[..start]);
        let Some(end) = rest[start..].find("\"]") else {
            out.push_str(&rest[start..]);
            return out;
        };
        let region = &rest[start + 2..start + end];
        if !region.is_empty() {
            out.push('*');
        }
        rest = &rest[start + end + 2..];
    }
    out.push_str(rest);
    out
}
