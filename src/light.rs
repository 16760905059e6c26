//! Individual light control.

use std::sync::Arc;

use futures::future::BoxFuture;
use log::debug;
use serde_json::{Value, json};
use tokio::sync::Mutex;

use crate::colors::{ColorConverter, StandardColors};
use crate::errors::Error;
use crate::history::{MessageHistory, MessageType};
use crate::reader;
use crate::registry::{CalibrationStore, DeviceRecord};
use crate::request::ControlRequest;
use crate::state::LightState;
use crate::translate::Translator;
use crate::transport::Transport;
use crate::types::Color;

type Result<T> = std::result::Result<T, Error>;

/// A classified ESPHome light bound to a transport.
///
/// Commands are built by [`Translator`] and sent in order; the first failed
/// request aborts the rest. Every exchange is kept in a bounded
/// [`MessageHistory`] shared between clones.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use esphome_lights_rs::{AdapterConfig, Calibration, DeviceClass, DeviceRecord, HttpTransport, Light};
///
/// let record = DeviceRecord::new("aabbccddeeff", "192.168.1.40", DeviceClass::Toggle, "Porch", Calibration::default());
/// let transport = HttpTransport::new(&AdapterConfig::default()).unwrap();
/// let light = Light::new(record, Arc::new(transport));
/// assert_eq!(light.name(), "Porch");
/// ```
#[derive(Clone)]
pub struct Light {
    record: DeviceRecord,
    transport: Arc<dyn Transport>,
    colors: Arc<dyn ColorConverter>,
    history: Arc<Mutex<MessageHistory>>,
}

impl std::fmt::Debug for Light {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Light").field("record", &self.record).finish()
    }
}

impl Light {
    pub fn new(record: DeviceRecord, transport: Arc<dyn Transport>) -> Self {
        Light {
            record,
            transport,
            colors: Arc::new(StandardColors),
            history: Arc::new(Mutex::new(MessageHistory::new())),
        }
    }

    /// Replace the color conversion collaborator.
    pub fn with_colors(mut self, colors: Arc<dyn ColorConverter>) -> Self {
        self.colors = colors;
        self
    }

    pub fn record(&self) -> &DeviceRecord {
        &self.record
    }

    pub fn id(&self) -> &str {
        self.record.id()
    }

    pub fn name(&self) -> &str {
        self.record.name()
    }

    pub fn address(&self) -> &str {
        self.record.address()
    }

    /// Apply `delta` and return the requests that were sent.
    pub async fn set(
        &self,
        delta: &LightState,
        last_known: &LightState,
        calibrations: &dyn CalibrationStore,
    ) -> Result<ControlRequest> {
        let commands = Translator::new(calibrations, self.colors.as_ref()).translate(
            &self.record,
            delta,
            last_known,
        );
        self.send(commands).await
    }

    /// Like [`Light::set`], sending `rgb` in place of a converted `xy`.
    pub async fn set_with_rgb(
        &self,
        delta: &LightState,
        last_known: &LightState,
        calibrations: &dyn CalibrationStore,
        rgb: Color,
    ) -> Result<ControlRequest> {
        let commands = Translator::new(calibrations, self.colors.as_ref()).translate_with_rgb(
            &self.record,
            delta,
            last_known,
            rgb,
        );
        self.send(commands).await
    }

    /// Queries the device for its current state (live network call).
    pub async fn get_state(&self) -> Result<LightState> {
        let recorded = Recorded { light: self };
        reader::read_state(&recorded, &self.record, self.colors.as_ref()).await
    }

    pub async fn history(&self) -> MessageHistory {
        self.history.lock().await.clone()
    }

    pub async fn clear_history(&self) {
        self.history.lock().await.clear();
    }

    /// Returns diagnostics including identity, calibration, and history.
    pub async fn diagnostics(&self) -> Value {
        let calibration = self.record.calibration();
        let class = self.record.class();
        let mut diag = json!({
            "id": self.record.id(),
            "address": self.record.address(),
            "name": self.record.name(),
            "class": class,
            "model_id": class.model_id(),
            "light_type": class.light_type(),
            "archetype": class.archetype(),
            "calibration": {
                "ct_boost": calibration.ct_boost,
                "rgb_boost": calibration.rgb_boost,
            },
        });

        // Read first so the summary includes this exchange.
        if let Ok(state) = self.get_state().await {
            diag["state"] = serde_json::to_value(state).unwrap_or(Value::Null);
        }

        let summary = self.history.lock().await.summary();
        diag["history"] = serde_json::to_value(summary).unwrap_or(Value::Null);

        diag
    }

    async fn send(&self, commands: ControlRequest) -> Result<ControlRequest> {
        let recorded = Recorded { light: self };
        for request in commands.requests() {
            let path = request.path();
            debug!("{} <- {}", self.record.address(), path);
            recorded.post(self.record.address(), &path).await?;
        }
        Ok(commands)
    }
}

/// Transport wrapper logging every exchange into the light's history.
struct Recorded<'l> {
    light: &'l Light,
}

impl Recorded<'_> {
    async fn exchange(
        &self,
        address: &str,
        path: &str,
        response: BoxFuture<'_, Result<String>>,
    ) -> Result<String> {
        let history = &self.light.history;
        history.lock().await.record(MessageType::Send, path, path);
        match response.await {
            Ok(body) => {
                history.lock().await.record(MessageType::Receive, path, &body);
                Ok(body)
            }
            Err(e) => {
                debug!("{address}{path} failed: {e}");
                history.lock().await.record_error(&e.to_string());
                Err(e)
            }
        }
    }
}

impl Transport for Recorded<'_> {
    fn get<'a>(&'a self, address: &'a str, path: &'a str) -> BoxFuture<'a, Result<String>> {
        Box::pin(self.exchange(address, path, self.light.transport.get(address, path)))
    }

    fn post<'a>(&'a self, address: &'a str, path: &'a str) -> BoxFuture<'a, Result<String>> {
        Box::pin(self.exchange(address, path, self.light.transport.post(address, path)))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::config::DeviceClass;
    use crate::transport::mock::{Reply, ScriptedTransport};
    use crate::types::{Calibration, ColorMode};

    const ADDR: &str = "10.0.0.9";

    fn light(class: DeviceClass, transport: ScriptedTransport) -> (Light, Arc<ScriptedTransport>) {
        let transport = Arc::new(transport);
        let record = DeviceRecord::new("a1b2c3d4e5f6", ADDR, class, "Lamp", Calibration::default());
        (Light::new(record, transport.clone()), transport)
    }

    #[tokio::test]
    async fn test_set_posts_requests_in_order() {
        let (light, transport) = light(DeviceClass::Rgbw, ScriptedTransport::new());
        let delta = LightState {
            ct: Some(250),
            ..LightState::default()
        };
        let calibrations: HashMap<String, Calibration> = HashMap::new();

        let sent = light
            .set(&delta, &LightState::default(), &calibrations)
            .await
            .unwrap();

        let calls = transport.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].2, "/light/color_led/turn_off");
        assert_eq!(calls[1].2, "/light/white_led/turn_on?color_temp=250&transition=0.4");
        assert_eq!(sent.paths(), calls.iter().map(|c| c.2.clone()).collect::<Vec<_>>());
        assert!(calls.iter().all(|c| c.0 == "POST"));
    }

    #[tokio::test]
    async fn test_set_aborts_on_first_failure() {
        let transport = ScriptedTransport::new().reply(
            ADDR,
            "/light/color_led/turn_off",
            Reply::Timeout,
        );
        let (light, transport) = light(DeviceClass::Rgbw, transport);
        let delta = LightState {
            ct: Some(250),
            ..LightState::default()
        };
        let calibrations: HashMap<String, Calibration> = HashMap::new();

        let result = light.set(&delta, &LightState::default(), &calibrations).await;
        assert_eq!(
            result.unwrap_err(),
            Error::timeout(ADDR, "/light/color_led/turn_off")
        );
        assert_eq!(transport.calls().len(), 1);
        assert!(light.history().await.last_error().is_some());
    }

    #[tokio::test]
    async fn test_get_state_records_history() {
        let transport = ScriptedTransport::new().body(
            ADDR,
            "/light/white_led",
            r#"{"state":"ON","brightness":200,"color_temp":370}"#,
        );
        let (light, _) = light(DeviceClass::ColorTemp, transport);

        let state = light.get_state().await.unwrap();
        assert_eq!(state.colormode, Some(ColorMode::Ct));
        assert_eq!(state.ct, Some(370));
        assert_eq!(state.bri, Some(200));

        let history = light.history().await;
        assert_eq!(history.len(), 2);
        assert!(
            history
                .latest(MessageType::Receive, "/light/white_led")
                .is_some_and(|body| body.contains("370"))
        );

        light.clear_history().await;
        assert!(light.history().await.is_empty());
    }

    #[tokio::test]
    async fn test_diagnostics_without_device() {
        let (light, _) = light(DeviceClass::Dimmable, ScriptedTransport::new());
        let diag = light.diagnostics().await;
        assert_eq!(diag["id"], "a1b2c3d4e5f6");
        assert_eq!(diag["class"], "ESPHome-Dimmable");
        assert_eq!(diag["model_id"], "ESPHome-Dimmable");
        assert_eq!(diag["light_type"], "Dimmable light");
        assert_eq!(diag["archetype"], "classicbulb");
        assert!(diag.get("state").is_none());
        assert_eq!(diag["history"]["send_count"], 1);
        assert!(diag["history"]["last_error"].is_string());
    }
}
