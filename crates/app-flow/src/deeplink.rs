//! Coordinate-carrying deep links per vendor.

use ridescan_core_types::Place;
use tracing::warn;
use url::{form_urlencoded, Url};

use crate::catalog::TargetApp;

fn coord(value: f64) -> String {
    format!("{:.6}", value)
}

fn encode(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// Builds the vendor link that opens `app` with the route pre-filled.
/// Returns `None` for services without coordinate hand-off.
pub fn deep_link(app: &TargetApp, pickup: &Place, dropoff: &Place) -> Option<Url> {
    if !app.coordinate_link {
        return None;
    }
    let raw = match app.key.as_str() {
        "uber" => {
            let mut link = format!(
                "https://m.uber.com/ul/?action=setPickup\
                 &pickup[latitude]={}&pickup[longitude]={}",
                coord(pickup.lat()),
                coord(pickup.lng()),
            );
            if !pickup.name.is_empty() {
                link.push_str(&format!("&pickup[nickname]={}", encode(&pickup.name)));
            }
            link.push_str(&format!(
                "&dropoff[latitude]={}&dropoff[longitude]={}",
                coord(dropoff.lat()),
                coord(dropoff.lng()),
            ));
            if !dropoff.name.is_empty() {
                link.push_str(&format!("&dropoff[nickname]={}", encode(&dropoff.name)));
            }
            link
        }
        "ola" => format!(
            "https://olawebcdn.com/assets/ola-universal-link.html\
             ?lat={}&lng={}&category=share&utm_source=xapp_token&landing_page=bk\
             &drop_lat={}&drop_lng={}&affiliate_uid=12345",
            coord(pickup.lat()),
            coord(pickup.lng()),
            coord(dropoff.lat()),
            coord(dropoff.lng()),
        ),
        "rapido" => format!(
            "https://m.rapido.bike/book?pickup_lat={}&pickup_lng={}&drop_lat={}&drop_lng={}",
            coord(pickup.lat()),
            coord(pickup.lng()),
            coord(dropoff.lat()),
            coord(dropoff.lng()),
        ),
        "nammayatri" => format!(
            "nammayatri://search?pickup_lat={}&pickup_lng={}&drop_lat={}&drop_lng={}",
            coord(pickup.lat()),
            coord(pickup.lng()),
            coord(dropoff.lat()),
            coord(dropoff.lng()),
        ),
        other => {
            warn!(app = other, "No deep-link template");
            return None;
        }
    };
    match Url::parse(&raw) {
        Ok(url) => Some(url),
        Err(err) => {
            warn!(app = %app.key, error = %err, "Generated deep link does not parse");
            None
        }
    }
}
