use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::Serialize;

use crate::content::{Map, Venue};

pub const DEFAULT_MAP_ZOOM: u8 = 15;
pub const TMAP_WEB_FALLBACK: &str = "https://tmap.co.kr";

/// Deep links into the navigation apps offered under the venue map.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct NavigationLinks {
    pub amap: String,
    pub naver: String,
    pub kakao: String,
    pub tmap: String,
    pub tmap_fallback: String,
}

/// What the browser needs to bring up the AMap SDK.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MapSettings {
    pub key: String,
    pub security_code: String,
    /// `[longitude, latitude]`, AMap order.
    pub center: [f64; 2],
    pub zoom: u8,
    pub venue_name: String,
}

impl MapSettings {
    pub fn longitude(&self) -> f64 {
        self.center[0]
    }

    pub fn latitude(&self) -> f64 {
        self.center[1]
    }
}

/// Everything `encodeURIComponent` escapes.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, URI_COMPONENT).to_string()
}

/// Leading integer of a zoom string ("17z" -> 17). Zero is no zoom.
fn parse_zoom(value: &str) -> Option<u8> {
    let value = value.trim();
    let digits = value
        .find(|c: char| !c.is_ascii_digit())
        .map_or(value, |end| &value[..end]);
    digits.parse::<u8>().ok().filter(|zoom| *zoom > 0)
}

pub fn navigation_links(venue: &Venue) -> NavigationLinks {
    let lat = venue.coordinates.latitude;
    let lng = venue.coordinates.longitude;
    let name = encode_component(&venue.name);

    NavigationLinks {
        amap: format!(
            "https://uri.amap.com/navigation?dest={},{}&destName={}",
            lng, lat, name
        ),
        naver: format!(
            "https://map.naver.com/p/directions/-/-/-/walk/place/{}?c={},0,0,0,dh",
            venue.place_id.trim(),
            venue.map_zoom.trim()
        ),
        kakao: format!("https://map.kakao.com/link/to/{},{},{}", name, lat, lng),
        tmap: format!("tmap://route?goalname={}&goaly={}&goalx={}", name, lat, lng),
        tmap_fallback: TMAP_WEB_FALLBACK.to_string(),
    }
}

/// `None` unless both the key and the security code are set.
pub fn map_settings(venue: &Venue, map: &Map) -> Option<MapSettings> {
    if !map.is_configured() {
        return None;
    }

    Some(MapSettings {
        key: map.amap_key.clone(),
        security_code: map.amap_security_code.clone(),
        center: [venue.coordinates.longitude, venue.coordinates.latitude],
        zoom: parse_zoom(&venue.map_zoom).unwrap_or(DEFAULT_MAP_ZOOM),
        venue_name: venue.name.clone(),
    })
}
