//! Reading device state back into the generic light representation.

use log::{debug, warn};

use crate::colors::ColorConverter;
use crate::config::DeviceClass;
use crate::errors::Error;
use crate::registry::DeviceRecord;
use crate::request::Channel;
use crate::response::ChannelStatus;
use crate::state::LightState;
use crate::transport::Transport;
use crate::types::ColorMode;

type Result<T> = std::result::Result<T, Error>;

/// Query every channel of `record`'s class and normalize the answers.
///
/// Any failed or malformed read fails the whole call; no partial state is
/// returned.
pub async fn read_state(
    transport: &dyn Transport,
    record: &DeviceRecord,
    colors: &dyn ColorConverter,
) -> Result<LightState> {
    debug!("reading {} ({:?}) at {}", record.id(), record.class(), record.address());
    let read = |channel: Channel| read_channel(transport, record.address(), channel);

    match record.class() {
        DeviceClass::Rgbw => {
            let (white, color) = futures::try_join!(read(Channel::White), read(Channel::Color))?;
            normalize_rgbw(record.id(), &white, &color, colors)
        }
        DeviceClass::ColorTemp => normalize_white(&read(Channel::White).await?),
        DeviceClass::Rgb => normalize_color(&read(Channel::Color).await?, colors),
        DeviceClass::Dimmable => normalize_dimmable(&read(Channel::Dimmable).await?),
        DeviceClass::Toggle => Ok(normalize_toggle(&read(Channel::Toggle).await?)),
    }
}

async fn read_channel(
    transport: &dyn Transport,
    address: &str,
    channel: Channel,
) -> Result<ChannelStatus> {
    let body = transport.get(address, channel.path()).await?;
    ChannelStatus::parse(channel.path(), &body)
}

/// Both channels on is inconsistent hardware state; the white reading wins.
pub fn normalize_rgbw(
    id: &str,
    white: &ChannelStatus,
    color: &ChannelStatus,
    colors: &dyn ColorConverter,
) -> Result<LightState> {
    match (white.is_on(), color.is_on()) {
        (false, false) => Ok(LightState::off()),
        (true, color_on) => {
            if color_on {
                warn!("{id}: white and color channels both report on, using white");
            }
            normalize_white(white)
        }
        (false, true) => normalize_color(color, colors),
    }
}

pub fn normalize_white(white: &ChannelStatus) -> Result<LightState> {
    if !white.is_on() {
        return Ok(LightState::off());
    }
    let path = Channel::White.path();
    Ok(LightState {
        on: Some(true),
        ct: Some(white.ct(path)?),
        bri: Some(white.bri(path)?),
        colormode: Some(ColorMode::Ct),
        ..LightState::default()
    })
}

pub fn normalize_color(color: &ChannelStatus, colors: &dyn ColorConverter) -> Result<LightState> {
    if !color.is_on() {
        return Ok(LightState::off());
    }
    let path = Channel::Color.path();
    Ok(LightState {
        on: Some(true),
        xy: Some(colors.rgb_to_xy(color.rgb(path)?)),
        bri: Some(color.bri(path)?),
        colormode: Some(ColorMode::Xy),
        ..LightState::default()
    })
}

pub fn normalize_dimmable(dimmable: &ChannelStatus) -> Result<LightState> {
    if !dimmable.is_on() {
        return Ok(LightState::off());
    }
    Ok(LightState {
        on: Some(true),
        bri: Some(dimmable.bri(Channel::Dimmable.path())?),
        ..LightState::default()
    })
}

pub fn normalize_toggle(toggle: &ChannelStatus) -> LightState {
    LightState {
        on: Some(toggle.is_on()),
        ..LightState::default()
    }
}
