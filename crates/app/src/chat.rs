//! Terminal chat client
//!
//! Reads the operator's lines, sends them as chat, and renders every
//! broadcast through a [`Presenter`].

use natter_net::{Client, ClientEvent, Error};
use tokio::io::{AsyncBufRead, Lines};
use tracing::{debug, warn};

use crate::config::{validate_name, ClientSettings};
use crate::console::EXIT_COMMAND;
use crate::presenter::Presenter;

/// Run one client session until the operator exits or input ends
pub async fn run<R, P>(
    settings: &ClientSettings,
    mut input: Lines<R>,
    presenter: &mut P,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    P: Presenter,
{
    presenter.output("To shutdown the client type EXIT.");

    let name = match &settings.name {
        Some(name) => name.clone(),
        None => match prompt_name(&mut input, presenter).await? {
            Some(name) => name,
            None => return Ok(()),
        },
    };

    let mut client = match Client::connect(&settings.address, settings.port, name).await {
        Ok(client) => client,
        Err(e) => {
            warn!(error = %e, "Connection failed");
            presenter.output("Error connecting to server, please check args and try again");
            return Ok(());
        }
    };

    let mut connected = true;
    loop {
        tokio::select! {
            biased;

            event = client.next_event(), if connected => match event {
                Some(ClientEvent::Line(line)) => presenter.output(&line),
                Some(ClientEvent::Disconnected) | None => {
                    warn!("Lost connection to server");
                    connected = false;
                }
            },

            line = input.next_line() => match line? {
                Some(line) if line.trim() == EXIT_COMMAND => {
                    leave(&client).await;
                    break;
                }
                Some(line) => match client.send_chat(&line).await {
                    Ok(()) => {}
                    Err(Error::Protocol(reason)) => {
                        debug!(reason = %reason, "Line not sent");
                        presenter.output("Message too long, not sent");
                    }
                    Err(e) => {
                        debug!(error = %e, "Send failed");
                        presenter.output("Server could not be found. Please try again later");
                    }
                },
                None => {
                    leave(&client).await;
                    break;
                }
            },
        }
    }

    Ok(())
}

/// Ask until a usable name is typed; `None` if input ends
async fn prompt_name<R, P>(input: &mut Lines<R>, presenter: &mut P) -> anyhow::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
    P: Presenter,
{
    loop {
        presenter.output("Please enter your name: ");
        let Some(line) = input.next_line().await? else {
            return Ok(None);
        };
        let name = line.trim();
        if validate_name(name).is_ok() {
            return Ok(Some(name.to_string()));
        }
    }
}

async fn leave(client: &Client) {
    if let Err(e) = client.leave().await {
        debug!(error = %e, "Leave notice not delivered");
    }
}
