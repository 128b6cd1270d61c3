//! Pause, rings, channels, coalescing, features and FEC.
//!
//! These follow the same pattern on either transport: a show reads and
//! prints, a set does a read-modify-write through the route.

use nicctl::params::records::{
    ChannelRequest, CoalesceRequest, FeatureRequest, FecRequest, PauseRequest, RingRequest,
};

use super::Ctx;
use crate::exit::{self, Failure, fail};

pub async fn show_pause(ctx: &Ctx<'_>) -> Result<(), Failure> {
    let pause = ctx
        .route()?
        .get_pause()
        .await
        .map_err(fail(exit::PAUSE_GET, "Cannot get device pause settings"))?;
    ctx.emit(exit::PAUSE_GET, &pause)
}

pub async fn set_pause(ctx: &Ctx<'_>, req: &PauseRequest) -> Result<(), Failure> {
    ctx.route()?
        .set_pause(req)
        .await
        .map_err(|e| Failure::from_change(exit::PAUSE_GET, exit::PAUSE_SET, "pause parameters", &e))
}

pub async fn show_rings(ctx: &Ctx<'_>) -> Result<(), Failure> {
    let rings = ctx
        .route()?
        .get_rings()
        .await
        .map_err(fail(exit::RING_GET, "Cannot get device ring settings"))?;
    ctx.emit(exit::RING_GET, &rings)
}

pub async fn set_rings(ctx: &Ctx<'_>, req: &RingRequest) -> Result<(), Failure> {
    ctx.route()?
        .set_rings(req)
        .await
        .map_err(|e| Failure::from_change(exit::RING_GET, exit::RING_SET, "ring parameters", &e))
}

pub async fn show_channels(ctx: &Ctx<'_>) -> Result<(), Failure> {
    let channels = ctx
        .route()?
        .get_channels()
        .await
        .map_err(fail(exit::CHANNELS_GET, "Cannot get device channel parameters"))?;
    ctx.emit(exit::CHANNELS_GET, &channels)
}

pub async fn set_channels(ctx: &Ctx<'_>, req: &ChannelRequest) -> Result<(), Failure> {
    ctx.route()?.set_channels(req).await.map_err(|e| {
        Failure::from_change(exit::CHANNELS_GET, exit::CHANNELS_SET, "channel parameters", &e)
    })
}

pub async fn show_coalesce(ctx: &Ctx<'_>) -> Result<(), Failure> {
    let coalesce = ctx
        .route()?
        .get_coalesce()
        .await
        .map_err(fail(exit::COALESCE_GET, "Cannot get device coalesce settings"))?;
    ctx.emit(exit::COALESCE_GET, &coalesce)
}

pub async fn set_coalesce(ctx: &Ctx<'_>, req: &CoalesceRequest) -> Result<(), Failure> {
    ctx.route()?.set_coalesce(req).await.map_err(|e| {
        Failure::from_change(exit::COALESCE_GET, exit::COALESCE_SET, "coalesce parameters", &e)
    })
}

pub async fn show_features(ctx: &Ctx<'_>) -> Result<(), Failure> {
    let features = ctx
        .route()?
        .get_features()
        .await
        .map_err(fail(exit::FEATURES_GET, "Cannot get device features"))?;
    ctx.emit(exit::FEATURES_GET, &features)
}

pub async fn set_features(ctx: &Ctx<'_>, req: &FeatureRequest) -> Result<(), Failure> {
    ctx.route()?.set_features(&req.changes).await.map_err(|e| {
        Failure::from_change(exit::FEATURES_GET, exit::FEATURES_SET, "device features", &e)
    })
}

pub async fn show_fec(ctx: &Ctx<'_>) -> Result<(), Failure> {
    let fec = ctx
        .route()?
        .get_fec()
        .await
        .map_err(fail(exit::FEC_GET, "Cannot get FEC settings"))?;
    ctx.emit(exit::FEC_GET, &fec)
}

pub async fn set_fec(ctx: &Ctx<'_>, req: &FecRequest) -> Result<(), Failure> {
    ctx.route()?
        .set_fec(req)
        .await
        .map_err(|e| Failure::from_change(exit::FEC_SET, exit::FEC_SET, "FEC settings", &e))
}
