//! `--monitor`: print configuration changes as the kernel reports them.

use std::io::{self, Write};

use nicctl::command::CommandDesc;
use nicctl::negotiate::DeviceHandle;
use tokio_stream::StreamExt;

use crate::exit::{self, Failure};
use crate::output::{OutputFormat, print_event};

pub async fn run(
    handle: &mut DeviceHandle,
    desc: &'static CommandDesc,
    format: OutputFormat,
) -> Result<(), Failure> {
    handle
        .route(desc)
        .map_err(|e| Failure::from_error(exit::MONITOR, "Cannot monitor", &e))?;

    let filter = handle.ifname().map(str::to_string);
    let conn = handle
        .netlink_mut()
        .map_err(|e| Failure::from_error(exit::MONITOR, "Cannot monitor", &e))?;
    conn.subscribe()
        .map_err(|e| Failure::from_error(exit::MONITOR, "Cannot subscribe to notifications", &e))?;

    if format == OutputFormat::Text {
        match &filter {
            Some(dev) => println!("listening for ethtool events on {dev}..."),
            None => println!("listening for ethtool events..."),
        }
    }

    let mut events = conn.events();
    while let Some(event) = events.next().await {
        let event = match event {
            Ok(event) => event,
            Err(e) => {
                return Err(Failure::from_error(exit::MONITOR, "Cannot receive notification", &e));
            }
        };
        if let Some(dev) = &filter
            && event.ifname.as_deref() != Some(dev.as_str())
        {
            continue;
        }
        let mut out = io::stdout().lock();
        print_event(&mut out, &event, format)
            .and_then(|()| out.flush())
            .map_err(|e| Failure::new(exit::MONITOR, format!("Cannot write output: {e}")))?;
    }
    Ok(())
}
