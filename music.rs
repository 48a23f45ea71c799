//! Read-only client for the music streaming Web API
//!
//! The library builds requests and classifies responses; the host supplies
//! the HTTPS transport and decides how to decode bodies. Every call answers
//! with a [`MusicResult`], so a missing token or a dead network shows up as
//! [`MusicResult::Unavailable`] in the caller's control flow.

use core::fmt::{self, Write};

use heapless::String;
use log::warn;

pub const API_BASE: &str = "https://api.spotify.com/";
pub const CURRENTLY_PLAYING: &str = "v1/me/player/currently-playing";
pub const TOP_TRACKS: &str = "v1/me/top/tracks?time_range=long_term&limit=5";

pub const URL_LEN: usize = 192;
pub const AUTHORIZATION_LEN: usize = 512;

/// An authenticated GET.
#[derive(Debug, PartialEq, Eq)]
pub struct Request<'a> {
    pub url: &'a str,
    pub authorization: &'a str,
}

#[derive(Debug)]
pub struct Response<B> {
    pub status: u16,
    pub body: B,
}

/// HTTPS GET supplied by the host.
pub trait Transport {
    type Body;
    type Error: fmt::Debug;

    fn get(&mut self, request: &Request<'_>) -> Result<Response<Self::Body>, Self::Error>;
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Unavailable {
    /// The transport could not complete the request.
    Transport,
    /// 401/403: missing, expired or under-scoped token.
    Unauthorized,
    /// Any other non-success status.
    Status(u16),
    /// URL or header did not fit the request buffers.
    RequestTooLong,
}

#[derive(Debug, PartialEq)]
pub enum MusicResult<B> {
    Available(B),
    /// 204: the call succeeded but there is nothing to report.
    Empty,
    Unavailable(Unavailable),
}

pub struct MusicClient<'a, T> {
    transport: T,
    token: &'a str,
    playlist_id: &'a str,
}

impl<'a, T: Transport> MusicClient<'a, T> {
    pub fn new(transport: T, token: &'a str, playlist_id: &'a str) -> Self {
        Self {
            transport,
            token,
            playlist_id,
        }
    }

    pub fn currently_playing(&mut self) -> MusicResult<T::Body> {
        self.fetch(format_args!("{}", CURRENTLY_PLAYING))
    }

    pub fn top_tracks(&mut self) -> MusicResult<T::Body> {
        self.fetch(format_args!("{}", TOP_TRACKS))
    }

    pub fn playlist(&mut self) -> MusicResult<T::Body> {
        let id = self.playlist_id;
        self.fetch(format_args!("v1/playlists/{}", id))
    }

    fn fetch(&mut self, endpoint: fmt::Arguments<'_>) -> MusicResult<T::Body> {
        let mut url: String<URL_LEN> = String::new();
        let mut authorization: String<AUTHORIZATION_LEN> = String::new();
        if write!(url, "{}{}", API_BASE, endpoint).is_err()
            || write!(authorization, "Bearer {}", self.token).is_err()
        {
            warn!("music request for {} does not fit its buffers", endpoint);
            return MusicResult::Unavailable(Unavailable::RequestTooLong);
        }

        let request = Request {
            url: &url,
            authorization: &authorization,
        };
        match self.transport.get(&request) {
            Ok(Response { status: 204, .. }) => MusicResult::Empty,
            Ok(Response { status, body }) if (200..300).contains(&status) => MusicResult::Available(body),
            Ok(Response { status: status @ (401 | 403), .. }) => {
                warn!("music request {} rejected with {}", request.url, status);
                MusicResult::Unavailable(Unavailable::Unauthorized)
            }
            Ok(Response { status, .. }) => {
                warn!("music request {} failed with {}", request.url, status);
                MusicResult::Unavailable(Unavailable::Status(status))
            }
            Err(e) => {
                warn!("music request {} failed: {:?}", request.url, e);
                MusicResult::Unavailable(Unavailable::Transport)
            }
        }
    }
}
