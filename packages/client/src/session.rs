//! Chat session over a connected TCP stream.

use futures_util::{SinkExt, StreamExt};
use hiroba_shared::signal::shutdown_signal;
use tokio::{net::TcpStream, sync::mpsc};
use tokio_util::codec::{Framed, LinesCodec};

use crate::{
    domain::{InputAction, SessionEnd, classify_input},
    error::ClientError,
    formatter::{CLEAR_SCREEN, MessageFormatter},
    ui::redisplay_prompt,
};

/// Longest line accepted from the server
pub const MAX_LINE_LENGTH: usize = 4096;

/// Run one chat session.
///
/// The first line from `input` is sent as the username; every later line
/// goes through [`classify_input`]. Returns once the server closes the
/// stream, the input channel closes, the user quits, or a shutdown
/// signal arrives.
pub async fn run_session(
    stream: TcpStream,
    mut input: mpsc::UnboundedReceiver<String>,
) -> Result<SessionEnd, ClientError> {
    let (mut writer, mut reader) =
        Framed::new(stream, LinesCodec::new_with_max_length(MAX_LINE_LENGTH)).split();

    let Some(username) = input.recv().await else {
        return Ok(SessionEnd::UserQuit);
    };
    writer.send(username.trim().to_string()).await?;

    // Spawn a task to print incoming lines
    let mut read_task = tokio::spawn(async move {
        while let Some(frame) = reader.next().await {
            match frame {
                Ok(line) => {
                    print!("{}", MessageFormatter::format_incoming(&line));
                    redisplay_prompt();
                }
                Err(e) => {
                    tracing::warn!("Read error: {}", e);
                    break;
                }
            }
        }
        tracing::info!("Server closed the connection");
    });

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    let end = loop {
        tokio::select! {
            _ = &mut read_task => break SessionEnd::ServerClosed,
            _ = &mut shutdown => break SessionEnd::UserQuit,
            line = input.recv() => {
                let Some(line) = line else {
                    break SessionEnd::UserQuit;
                };
                match classify_input(&line) {
                    InputAction::Quit => break SessionEnd::UserQuit,
                    InputAction::Help => print!("{}", MessageFormatter::format_help()),
                    InputAction::Clear => {
                        print!("{}", CLEAR_SCREEN);
                        redisplay_prompt();
                    }
                    InputAction::Ignore => {}
                    InputAction::Send(text) => {
                        if let Err(e) = writer.send(text).await {
                            tracing::warn!("Failed to send message: {}", e);
                            break SessionEnd::ServerClosed;
                        }
                    }
                }
            }
        }
    };

    if end == SessionEnd::UserQuit {
        read_task.abort();
        if let Err(e) = writer.close().await {
            tracing::debug!("Failed to close connection: {}", e);
        }
    }

    Ok(end)
}
