use crate::document::SceneStateDocument;
use crate::error::Result;
use crate::fragment::{blend_fragment, blend_string};
use crate::host::{Host, HostCommand};
use crate::scene::SceneBuilder;

use super::SceneController;

/// What an import did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub layer_count: usize,
    pub mirrored_count: usize,
    /// Blend modes of all layers joined by `:`.
    pub blends: String,
}

impl<H: Host, B: SceneBuilder> SceneController<H, B> {
    /// Import a serialized scene-state document.
    ///
    /// The text is fully parsed before anything is touched: on error the
    /// session is unchanged and nothing has been sent to the host.
    pub fn import_state(&mut self, text: &str) -> Result<ImportSummary> {
        let doc = SceneStateDocument::from_json(text)?;

        self.session.reset();
        for (index, layer) in doc.layers.iter().enumerate() {
            self.session
                .record_layer(index, layer.kind.clone(), layer.config.clone());
        }

        self.send(HostCommand::Pause);
        self.send(HostCommand::InitLayers(doc.layer_kinds()));
        self.send(HostCommand::Import(doc.import_payload()));

        let mut mirrored_count = 0;
        for (index, layer) in doc.layers.iter().enumerate() {
            if !layer.kind.is_mirrored() {
                continue;
            }
            mirrored_count += 1;

            // Parsing always yields a surface config for mirrored layers.
            let config = layer.config.as_fss().cloned().unwrap_or_default();

            let scene = self.builder.build(&config, layer.scene_fuzz.as_deref());
            self.send(HostCommand::ConfigureMirroredFss {
                config,
                layer: index,
            });
            match scene {
                Some(scene) => {
                    self.session.store_scene(index, scene.clone());
                    self.send(HostCommand::RebuildFss {
                        scene,
                        layer: index,
                    });
                }
                None => log::warn!("scene builder produced nothing for layer {index}"),
            }
        }

        self.host.publish_fragment(&blend_fragment(&doc.layers));

        let summary = ImportSummary {
            layer_count: doc.layers.len(),
            mirrored_count,
            blends: blend_string(&doc.layers),
        };
        log::info!(
            "imported {} layer(s), {} mirrored, blends '{}'",
            summary.layer_count,
            summary.mirrored_count,
            summary.blends
        );
        Ok(summary)
    }
}
