use clap::Parser;
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_tungstenite::{connect_async, tungstenite::Message};

#[derive(Parser)]
#[command(name = "bridge-cli")]
#[command(about = "Interactive client for the WebSocket bridge", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "ws://localhost:8080/ws")]
    url: String,

    /// Send lines as text frames instead of binary frames.
    #[arg(short, long)]
    text: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let (stream, _) = connect_async(cli.url.as_str()).await?;
    eprintln!("Connected to {}", cli.url);
    let (mut write, mut read) = stream.split();

    let printer = tokio::spawn(async move {
        while let Some(frame) = read.next().await {
            match frame {
                Ok(Message::Text(text)) => println!("{}", text.as_str()),
                Ok(Message::Binary(bytes)) => println!("{}", String::from_utf8_lossy(&bytes)),
                Ok(Message::Close(frame)) => {
                    match frame {
                        Some(frame) => eprintln!(
                            "Closed by server: {} {}",
                            u16::from(frame.code),
                            frame.reason.as_str()
                        ),
                        None => eprintln!("Closed by server"),
                    }
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    eprintln!("Error: {}", e);
                    break;
                }
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let frame = if cli.text {
            Message::text(line)
        } else {
            Message::binary(line.into_bytes())
        };
        write.send(frame).await?;
    }

    // Stdin closed: ask the server to close and wait for its reply.
    write.send(Message::Close(None)).await?;
    printer.await?;
    Ok(())
}
