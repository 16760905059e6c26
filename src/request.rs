//! Outbound command encoding.

use std::fmt;

/// An independently addressable light channel on a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    White,
    Color,
    Dimmable,
    Toggle,
}

impl Channel {
    /// Status and control path of this channel.
    pub fn path(&self) -> &'static str {
        match self {
            Channel::White => "/light/white_led",
            Channel::Color => "/light/color_led",
            Channel::Dimmable => "/light/dimmable_led",
            Channel::Toggle => "/light/toggle_led",
        }
    }

    /// The channel that must be dark while this one is active on a device
    /// exposing both white and color channels.
    pub fn exclusive_peer(&self) -> Option<Channel> {
        match self {
            Channel::White => Some(Channel::Color),
            Channel::Color => Some(Channel::White),
            Channel::Dimmable | Channel::Toggle => None,
        }
    }
}

/// Target of a single request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Channel(Channel),
    /// The alert pulse switch
    Alert,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Channel(channel) => channel.path(),
            Endpoint::Alert => "/switch/alert",
        }
    }
}

/// Power action appended to an endpoint path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    TurnOn,
    TurnOff,
}

impl Action {
    pub fn path(&self) -> &'static str {
        match self {
            Action::TurnOn => "/turn_on",
            Action::TurnOff => "/turn_off",
        }
    }
}

/// One outbound request: endpoint, action, and ordered query parameters.
///
/// # Examples
///
/// ```
/// use esphome_lights_rs::{Action, Channel, Endpoint, Request};
///
/// let mut request = Request::new(Endpoint::Channel(Channel::White), Action::TurnOn);
/// request.param("brightness", 200);
/// request.param("transition", "0.4");
/// assert_eq!(request.path(), "/light/white_led/turn_on?brightness=200&transition=0.4");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub(crate) endpoint: Endpoint,
    pub(crate) action: Action,
    pub(crate) params: Vec<(String, String)>,
}

impl Request {
    pub fn new(endpoint: Endpoint, action: Action) -> Self {
        Request {
            endpoint,
            action,
            params: Vec::new(),
        }
    }

    pub fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    pub fn action(&self) -> Action {
        self.action
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// Look up a query parameter by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Append a query parameter; parameters keep insertion order.
    pub fn param(&mut self, key: &str, value: impl fmt::Display) -> &mut Self {
        self.params.push((key.to_string(), value.to_string()));
        self
    }

    /// Render the request path with its query string.
    pub fn path(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.endpoint.path(), self.action.path())?;
        for (i, (key, value)) in self.params.iter().enumerate() {
            let sep = if i == 0 { '?' } else { '&' };
            write!(f, "{sep}{key}={value}")?;
        }
        Ok(())
    }
}

/// The ordered requests implementing one command.
///
/// Order matters: an exclusive channel is shut down before the selected
/// channel is activated, and devices apply parameters as received.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControlRequest {
    pub(crate) requests: Vec<Request>,
}

impl ControlRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, request: Request) {
        self.requests.push(request);
    }

    pub fn requests(&self) -> &[Request] {
        &self.requests
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Rendered paths, in execution order.
    pub fn paths(&self) -> Vec<String> {
        self.requests.iter().map(Request::path).collect()
    }
}

impl IntoIterator for ControlRequest {
    type Item = Request;
    type IntoIter = std::vec::IntoIter<Request>;

    fn into_iter(self) -> Self::IntoIter {
        self.requests.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_without_params() {
        let request = Request::new(Endpoint::Alert, Action::TurnOn);
        assert_eq!(request.path(), "/switch/alert/turn_on");
    }

    #[test]
    fn test_params_keep_order() {
        let mut request = Request::new(Endpoint::Channel(Channel::Color), Action::TurnOn);
        request.param("r", 1).param("g", 2).param("b", 3);
        assert_eq!(request.path(), "/light/color_led/turn_on?r=1&g=2&b=3");
        assert_eq!(request.get("g"), Some("2"));
        assert_eq!(request.get("brightness"), None);
    }

    #[test]
    fn test_exclusive_peer() {
        assert_eq!(Channel::White.exclusive_peer(), Some(Channel::Color));
        assert_eq!(Channel::Color.exclusive_peer(), Some(Channel::White));
        assert_eq!(Channel::Toggle.exclusive_peer(), None);
    }
}
