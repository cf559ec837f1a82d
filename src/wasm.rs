//! WASM bindings: the browser-side bridge between the host application's
//! ports and the scene controller.
//!
//! Build with: `wasm-pack build --target web --features wasm`

use js_sys::{Function, JSON};
use wasm_bindgen::prelude::*;

use crate::bundle::PlayerAssets;
use crate::controller::{SceneController, UiEffect};
use crate::document::FssConfig;
use crate::fragment::parse_blend_fragment;
use crate::host::{GuiModel, Host, HostCommand};
use crate::relay::ControlChange;
use crate::scene::{Scene, SceneBuilder, VertexSnapshot};
use crate::ui::OverlayToggle;

fn to_js(value: &serde_json::Value) -> Result<JsValue, JsValue> {
    JSON::parse(&value.to_string())
}

/// Delivers commands through a JS `send(port, payload)` callback.
struct JsHost {
    send: Function,
}

impl Host for JsHost {
    fn send(&mut self, command: HostCommand) {
        let port = JsValue::from_str(command.port());
        let delivered = to_js(&command.payload())
            .and_then(|payload| self.send.call2(&JsValue::NULL, &port, &payload));
        if let Err(e) = delivered {
            log::warn!("host port {} rejected message: {e:?}", command.port());
        }
    }

    fn publish_fragment(&mut self, fragment: &str) {
        let global = js_sys::global();
        let result = js_sys::Reflect::get(&global, &"location".into()).and_then(|location| {
            js_sys::Reflect::set(&location, &"hash".into(), &JsValue::from_str(fragment))
        });
        if let Err(e) = result {
            log::warn!("cannot set location hash: {e:?}");
        }
    }
}

/// Delegates to the page's `buildFSS(config, fuzz)` function.
struct JsSceneBuilder {
    build_fss: Function,
}

impl JsSceneBuilder {
    fn try_build(
        &self,
        config: &FssConfig,
        fuzz: Option<&[VertexSnapshot]>,
    ) -> Result<Option<Scene>, String> {
        let config = serde_json::to_value(config).map_err(|e| e.to_string())?;
        let config = to_js(&config).map_err(|e| format!("{e:?}"))?;
        let fuzz = match fuzz {
            Some(seed) => {
                let seed = serde_json::to_value(seed).map_err(|e| e.to_string())?;
                to_js(&seed).map_err(|e| format!("{e:?}"))?
            }
            None => JsValue::UNDEFINED,
        };

        let scene = self
            .build_fss
            .call2(&JsValue::NULL, &config, &fuzz)
            .map_err(|e| format!("{e:?}"))?;
        if scene.is_undefined() || scene.is_null() {
            return Ok(None);
        }
        // Typed arrays survive as index-keyed objects, which Vec3 accepts.
        let text: String = JSON::stringify(&scene)
            .map_err(|e| format!("{e:?}"))?
            .into();
        serde_json::from_str(&text).map(Some).map_err(|e| e.to_string())
    }
}

impl SceneBuilder for JsSceneBuilder {
    fn build(&self, config: &FssConfig, fuzz: Option<&[VertexSnapshot]>) -> Option<Scene> {
        self.try_build(config, fuzz).unwrap_or_else(|e| {
            log::warn!("buildFSS failed: {e}");
            None
        })
    }
}

/// Bridge object the page creates once the host application is embedded.
#[wasm_bindgen]
pub struct SceneBridge {
    controller: SceneController<JsHost, JsSceneBuilder>,
    overlays: OverlayToggle,
}

#[wasm_bindgen]
impl SceneBridge {
    /// `send(port, payload)` delivers to the host's ports; `build_fss` is the
    /// page's scene builder.
    #[wasm_bindgen(constructor)]
    pub fn new(send: Function, build_fss: Function) -> SceneBridge {
        // Fails only when a logger is already installed.
        console_log::init_with_level(log::Level::Info).ok();
        SceneBridge {
            controller: SceneController::new(JsHost { send }, JsSceneBuilder { build_fss }),
            overlays: OverlayToggle::default(),
        }
    }

    /// Signal the host that the bridge is ready.
    pub fn start(&mut self) {
        self.controller.start();
    }

    /// Import a scene document. Throws on malformed input.
    #[wasm_bindgen(js_name = importState)]
    pub fn import_state(&mut self, text: &str) -> Result<(), JsError> {
        self.controller
            .import_state(text)
            .map(|_| ())
            .map_err(|e| JsError::new(&e.to_string()))
    }

    /// Handle the import button; returns the alert to show, if any.
    #[wasm_bindgen(js_name = submitImport)]
    pub fn submit_import(&mut self, text: &str) -> Option<String> {
        match self.controller.submit_import(text) {
            Some(UiEffect::Alert(message)) => Some(message),
            _ => None,
        }
    }

    /// Export the host state received on `export_`.
    #[wasm_bindgen(js_name = exportState)]
    pub fn export_state(&mut self, text: &str) -> Result<String, JsError> {
        self.controller
            .export_state(text)
            .map_err(|e| JsError::new(&e.to_string()))
    }

    /// Build `export.zip` from the state received on `exportZip_` and the
    /// player assets the page fetched.
    #[wasm_bindgen(js_name = exportZip)]
    pub fn export_zip(
        &mut self,
        text: &str,
        player_bundle: Vec<u8>,
        player_html: Vec<u8>,
    ) -> Result<Vec<u8>, JsError> {
        let assets = PlayerAssets {
            player_bundle,
            player_html,
        };
        self.controller
            .package(&assets, text)
            .map_err(|e| JsError::new(&e.to_string()))
    }

    /// Handle `startGui` / `requestFssRebuild`. Returns the number of
    /// scenes pushed to the host.
    #[wasm_bindgen(js_name = rebuildFss)]
    pub fn rebuild_fss(&mut self, model: &str) -> Result<usize, JsError> {
        let model: GuiModel =
            serde_json::from_str(model).map_err(|e| JsError::new(&e.to_string()))?;
        Ok(self.controller.rebuild_mirrored(&model))
    }

    /// Forward a GUI change, given as `{ name, value }`.
    pub fn relay(&mut self, change: &str) -> Result<(), JsError> {
        let change: ControlChange =
            serde_json::from_str(change).map_err(|e| JsError::new(&e.to_string()))?;
        self.controller.relay(change);
        Ok(())
    }

    /// Returns the CSS `display` value for overlay panels when the key
    /// toggles them.
    #[wasm_bindgen(js_name = onKeyDown)]
    pub fn on_key_down(&mut self, key_code: u32) -> Option<String> {
        self.overlays.on_key_down(key_code).map(str::to_string)
    }
}

/// Blend modes encoded in a `#blends=` fragment, or `undefined`.
#[wasm_bindgen(js_name = blendsFromHash)]
pub fn blends_from_hash(hash: &str) -> Option<Vec<String>> {
    parse_blend_fragment(hash).map(|blends| blends.into_iter().map(|b| b.0).collect())
}
