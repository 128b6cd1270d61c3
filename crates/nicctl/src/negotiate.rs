//! Transport selection.
//!
//! A [`DeviceHandle`] is opened once per invocation. It tries to set up
//! the generic netlink connection and the legacy control socket, and
//! [`DeviceHandle::route`] picks the transport for a command: netlink
//! when the kernel advertises every operation the command needs, the
//! legacy ioctl otherwise.
//!
//! Missing transport support (netlink disabled, no `ethtool` family,
//! operation not advertised, socket failure) is soft and falls back.
//! A driver rejecting the request is hard on either transport.
//!
//! # Example
//!
//! ```rust,no_run
//! use nicctl::command;
//! use nicctl::negotiate::DeviceHandle;
//!
//! # async fn example() -> nicctl::Result<()> {
//! let handle = DeviceHandle::open(Some("eth0"), false).await?;
//! let desc = command::lookup("-g").unwrap();
//! let rings = handle.route(desc)?.get_rings().await?;
//! println!("rx: {:?}/{:?}", rings.rx, rings.rx_max);
//! # Ok(())
//! # }
//! ```

use crate::command::CommandDesc;
use crate::error::{Error, Result};
use crate::ioctl::IoctlSocket;
use crate::ioctl::ops::ChangeError;
use crate::netlink::{Connection, Ethtool, EthtoolCmd};
use crate::params::records::{
    ChannelRequest, CoalesceRequest, FecRequest, LinkRequest, PauseRequest, RingRequest,
};
use crate::types::{
    Channels, Coalesce, Features, FecParams, LinkSettings, LinkState, MSG_CLASSES, MsgLevel, Pause,
    Rings, WolInfo,
};

type ChangeResult = std::result::Result<(), ChangeError>;

/// Both transports for one device.
///
/// Dropping the handle closes both sockets.
pub struct DeviceHandle {
    ifname: Option<String>,
    netlink: Option<Connection<Ethtool>>,
    ioctl: Option<IoctlSocket>,
}

impl DeviceHandle {
    /// Open the transports for `ifname`.
    ///
    /// Netlink problems are logged and leave the handle legacy-only. The
    /// control socket is required whenever a device is named; without a
    /// device only netlink is opened.
    pub async fn open(ifname: Option<&str>, disable_netlink: bool) -> Result<Self> {
        let netlink = if disable_netlink {
            tracing::debug!("netlink disabled by user");
            None
        } else {
            match Connection::<Ethtool>::new_async().await {
                Ok(conn) => Some(conn),
                Err(e) => {
                    tracing::debug!(error = %e, "netlink unavailable, using ioctl only");
                    None
                }
            }
        };

        let ioctl = ifname.map(IoctlSocket::open).transpose()?;

        Ok(Self {
            ifname: ifname.map(str::to_string),
            netlink,
            ioctl,
        })
    }

    /// Build a handle from already opened transports.
    pub fn from_parts(
        ifname: Option<String>,
        netlink: Option<Connection<Ethtool>>,
        ioctl: Option<IoctlSocket>,
    ) -> Self {
        Self {
            ifname,
            netlink,
            ioctl,
        }
    }

    pub fn ifname(&self) -> Option<&str> {
        self.ifname.as_deref()
    }

    /// Whether a netlink connection is open.
    pub fn has_netlink(&self) -> bool {
        self.netlink.is_some()
    }

    /// Pick the transport for `desc`.
    pub fn route(&self, desc: &CommandDesc) -> Result<Route<'_>> {
        if desc.netlink_only {
            return self.netlink_route().map_err(|_| {
                Error::NotSupported(format!("{} requires netlink", desc.name()))
            });
        }

        match self.netlink_unsupported(desc.netlink.all().copied()) {
            None => {
                tracing::debug!(command = desc.name(), "using netlink");
                self.netlink_route()
            }
            Some(reason) => {
                tracing::debug!(command = desc.name(), reason, "using ioctl");
                self.legacy_route()
            }
        }
    }

    /// The legacy transport, for requests netlink cannot carry.
    pub fn legacy(&self) -> Result<&IoctlSocket> {
        self.ioctl
            .as_ref()
            .ok_or_else(|| Error::NotSupported("no control socket".into()))
    }

    /// The netlink connection, for subscribing to notifications.
    pub fn netlink_mut(&mut self) -> Result<&mut Connection<Ethtool>> {
        self.netlink
            .as_mut()
            .ok_or_else(|| Error::NotSupported("netlink unavailable".into()))
    }

    /// Why netlink cannot serve `ops`, or `None` if it can.
    fn netlink_unsupported(&self, mut ops: impl Iterator<Item = EthtoolCmd>) -> Option<&'static str> {
        let Some(conn) = &self.netlink else {
            return Some("netlink unavailable");
        };
        let mut any = false;
        let all = ops.all(|cmd| {
            any = true;
            let ok = conn.supports(cmd);
            if !ok {
                tracing::debug!(?cmd, "not advertised by kernel");
            }
            ok
        });
        match (any, all) {
            (false, _) => Some("no netlink request"),
            (true, false) => Some("request not advertised"),
            (true, true) => None,
        }
    }

    fn netlink_route(&self) -> Result<Route<'_>> {
        match (&self.netlink, &self.ifname) {
            (Some(conn), Some(ifname)) => Ok(Route::Netlink {
                conn,
                ifname: ifname.as_str(),
            }),
            (Some(conn), None) => Ok(Route::Netlink { conn, ifname: "" }),
            (None, _) => Err(Error::NotSupported("netlink unavailable".into())),
        }
    }

    /// Force the legacy transport.
    pub fn legacy_route(&self) -> Result<Route<'_>> {
        self.legacy().map(Route::Legacy)
    }
}

/// The transport chosen for one command.
#[derive(Clone, Copy)]
pub enum Route<'a> {
    Netlink {
        conn: &'a Connection<Ethtool>,
        ifname: &'a str,
    },
    Legacy(&'a IoctlSocket),
}

impl Route<'_> {
    pub fn is_netlink(&self) -> bool {
        matches!(self, Route::Netlink { .. })
    }

    pub async fn get_link_settings(&self) -> Result<LinkSettings> {
        match self {
            Route::Netlink { conn, ifname } => conn.get_link_settings(ifname).await,
            Route::Legacy(sock) => sock.get_link_settings(),
        }
    }

    pub async fn set_link(&self, req: &LinkRequest) -> ChangeResult {
        match self {
            Route::Netlink { conn, ifname } => {
                conn.set_link(ifname, req).await.map_err(ChangeError::Write)
            }
            Route::Legacy(sock) => sock.set_link(req),
        }
    }

    pub async fn get_link_state(&self) -> Result<LinkState> {
        match self {
            Route::Netlink { conn, ifname } => conn.get_link_state(ifname).await,
            Route::Legacy(sock) => sock.get_link_state(),
        }
    }

    pub async fn get_wol(&self) -> Result<WolInfo> {
        match self {
            Route::Netlink { conn, ifname } => conn.get_wol(ifname).await,
            Route::Legacy(sock) => sock.get_wol(),
        }
    }

    pub async fn set_wol(&self, req: &LinkRequest) -> ChangeResult {
        match self {
            Route::Netlink { conn, ifname } => {
                let modes = req.wol.resolve();
                let sopass = req.sopass.value().copied();
                conn.set_wol(ifname, modes, sopass)
                    .await
                    .map_err(ChangeError::Write)
            }
            Route::Legacy(sock) => sock.set_wol(req),
        }
    }

    pub async fn get_msglvl(&self) -> Result<MsgLevel> {
        match self {
            Route::Netlink { conn, ifname } => conn.get_msglvl(ifname).await,
            Route::Legacy(sock) => sock.get_msglvl(),
        }
    }

    /// A numeric level replaces every known class; named classes only
    /// touch their own bits.
    pub async fn set_msglvl(&self, req: &LinkRequest) -> ChangeResult {
        match self {
            Route::Netlink { conn, ifname } => {
                let (value, mask) = match req.msglvl.value() {
                    Some(v) => (*v, (1u32 << MSG_CLASSES.len()) - 1),
                    None => (req.msglvl_flags.value, req.msglvl_flags.mask),
                };
                conn.set_msglvl(ifname, value, mask)
                    .await
                    .map_err(ChangeError::Write)
            }
            Route::Legacy(sock) => sock.set_msglvl(req),
        }
    }

    pub async fn get_features(&self) -> Result<Features> {
        match self {
            Route::Netlink { conn, ifname } => conn.get_features(ifname).await,
            Route::Legacy(sock) => sock.get_features(),
        }
    }

    pub async fn set_features(&self, changes: &[(String, bool)]) -> ChangeResult {
        match self {
            Route::Netlink { conn, ifname } => conn
                .set_features(ifname, changes)
                .await
                .map_err(ChangeError::Write),
            Route::Legacy(sock) => sock.set_features(changes),
        }
    }

    pub async fn get_rings(&self) -> Result<Rings> {
        match self {
            Route::Netlink { conn, ifname } => conn.get_rings(ifname).await,
            Route::Legacy(sock) => sock.get_rings(),
        }
    }

    pub async fn set_rings(&self, req: &RingRequest) -> ChangeResult {
        match self {
            Route::Netlink { conn, ifname } => {
                conn.set_rings(ifname, req).await.map_err(ChangeError::Write)
            }
            Route::Legacy(sock) => sock.set_rings(req),
        }
    }

    pub async fn get_channels(&self) -> Result<Channels> {
        match self {
            Route::Netlink { conn, ifname } => conn.get_channels(ifname).await,
            Route::Legacy(sock) => sock.get_channels(),
        }
    }

    pub async fn set_channels(&self, req: &ChannelRequest) -> ChangeResult {
        match self {
            Route::Netlink { conn, ifname } => conn
                .set_channels(ifname, req)
                .await
                .map_err(ChangeError::Write),
            Route::Legacy(sock) => sock.set_channels(req),
        }
    }

    pub async fn get_coalesce(&self) -> Result<Coalesce> {
        match self {
            Route::Netlink { conn, ifname } => conn.get_coalesce(ifname).await,
            Route::Legacy(sock) => sock.get_coalesce(),
        }
    }

    pub async fn set_coalesce(&self, req: &CoalesceRequest) -> ChangeResult {
        match self {
            Route::Netlink { conn, ifname } => conn
                .set_coalesce(ifname, req)
                .await
                .map_err(ChangeError::Write),
            Route::Legacy(sock) => sock.set_coalesce(req),
        }
    }

    pub async fn get_pause(&self) -> Result<Pause> {
        match self {
            Route::Netlink { conn, ifname } => conn.get_pause(ifname).await,
            Route::Legacy(sock) => sock.get_pause(),
        }
    }

    pub async fn set_pause(&self, req: &PauseRequest) -> ChangeResult {
        match self {
            Route::Netlink { conn, ifname } => {
                conn.set_pause(ifname, req).await.map_err(ChangeError::Write)
            }
            Route::Legacy(sock) => sock.set_pause(req),
        }
    }

    pub async fn get_fec(&self) -> Result<FecParams> {
        match self {
            Route::Netlink { conn, ifname } => conn.get_fec(ifname).await,
            Route::Legacy(sock) => sock.get_fec(),
        }
    }

    /// Names are only checked by the kernel on netlink; the legacy path
    /// maps them to mode bits and fails the write on unknown ones.
    pub async fn set_fec(&self, req: &FecRequest) -> ChangeResult {
        match self {
            Route::Netlink { conn, ifname } => {
                conn.set_fec(ifname, req).await.map_err(ChangeError::Write)
            }
            Route::Legacy(sock) => sock.set_fec(req),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{self, CommandKind};

    fn legacy_only() -> Option<DeviceHandle> {
        let sock = IoctlSocket::open("lo").ok()?;
        Some(DeviceHandle::from_parts(Some("lo".into()), None, Some(sock)))
    }

    #[test]
    fn without_netlink_everything_goes_legacy() {
        let Some(handle) = legacy_only() else {
            return;
        };
        for desc in command::COMMANDS
            .iter()
            .filter(|d| !d.netlink_only && d.kind != CommandKind::Help)
        {
            let route = handle.route(desc).unwrap();
            assert!(!route.is_netlink(), "{}", desc.name());
        }
    }

    #[test]
    fn netlink_only_commands_fail_without_netlink() {
        let Some(handle) = legacy_only() else {
            return;
        };
        let monitor = command::lookup("--monitor").unwrap();
        let Err(err) = handle.route(monitor) else {
            panic!("monitor routed without netlink");
        };
        assert!(err.is_soft_unsupported());
    }

    #[test]
    fn no_transports() {
        let handle = DeviceHandle::from_parts(None, None, None);
        let desc = command::lookup("-g").unwrap();
        assert!(handle.route(desc).is_err());
        assert!(handle.legacy().is_err());
        assert!(!handle.has_netlink());
    }

    #[tokio::test]
    async fn disabled_netlink_is_not_opened() {
        let Ok(handle) = DeviceHandle::open(Some("lo"), true).await else {
            return;
        };
        assert!(!handle.has_netlink());
        assert_eq!(handle.ifname(), Some("lo"));
        assert!(handle.legacy().is_ok());
    }
}
