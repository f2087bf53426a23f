//! Asynchronous surface texture loading.
//!
//! A load is requested with a [`TextureTicket`] and completes later through
//! [`TextureLoader::poll`]. The ticket travels with the result so the engine
//! can drop completions that belong to a scene it has already replaced.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::thread;

use crossbeam_channel::{Receiver, Sender, unbounded};
use foundation::ids::MaterialId;
use foundation::math::projection::ProjectionMode;
use gpu::TextureImage;
use tracing::{debug, warn};

use crate::error::TextureError;

/// Identifies the scene a texture load was issued for.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TextureTicket {
    pub generation: u64,
    pub mode: ProjectionMode,
    pub material: MaterialId,
}

#[derive(Debug)]
pub struct TextureCompletion {
    pub ticket: TextureTicket,
    pub identifier: String,
    pub result: Result<TextureImage, TextureError>,
}

pub trait TextureLoader {
    /// Starts loading `identifier`. Never blocks on I/O.
    fn request(&mut self, ticket: TextureTicket, identifier: &str);

    /// Completions that arrived since the last poll.
    fn poll(&mut self) -> Vec<TextureCompletion>;
}

/// Reads `<root>/<identifier>` and decodes it on a worker thread.
///
/// Identifiers are relative paths confined to the root; absolute ones or ones
/// with `..` complete with [`TextureError::NotFound`] without touching disk.
#[derive(Debug)]
pub struct FileTextureLoader {
    root: PathBuf,
    tx: Sender<TextureCompletion>,
    rx: Receiver<TextureCompletion>,
}

impl FileTextureLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let (tx, rx) = unbounded();
        Self {
            root: root.into(),
            tx,
            rx,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path under the root for `identifier`, or `None` if it would leave it.
    pub fn resolve(&self, identifier: &str) -> Option<PathBuf> {
        let relative = Path::new(identifier);
        let mut components = relative.components().peekable();
        components.peek()?;
        if components.all(|c| matches!(c, Component::Normal(_) | Component::CurDir)) {
            Some(self.root.join(relative))
        } else {
            None
        }
    }

    /// Synchronous read + decode, also used by the worker.
    pub fn load(path: &Path) -> Result<TextureImage, TextureError> {
        let bytes = std::fs::read(path).map_err(|source| TextureError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let rgba = image::load_from_memory(&bytes)?.to_rgba8();
        let (width, height) = rgba.dimensions();
        Ok(TextureImage::new(width, height, rgba.into_raw())?)
    }
}

impl TextureLoader for FileTextureLoader {
    fn request(&mut self, ticket: TextureTicket, identifier: &str) {
        let Some(path) = self.resolve(identifier) else {
            warn!(texture = identifier, "texture identifier escapes the texture root");
            let _ = self.tx.send(TextureCompletion {
                ticket,
                identifier: identifier.to_string(),
                result: Err(TextureError::NotFound(identifier.to_string())),
            });
            return;
        };
        let identifier = identifier.to_string();
        let tx = self.tx.clone();
        debug!(path = %path.display(), generation = ticket.generation, "texture load requested");
        thread::spawn(move || {
            let result = Self::load(&path);
            // The receiver lives as long as the loader; a send error means it was dropped.
            let _ = tx.send(TextureCompletion {
                ticket,
                identifier,
                result,
            });
        });
    }

    fn poll(&mut self) -> Vec<TextureCompletion> {
        self.rx.try_iter().collect()
    }
}

/// Serves pre-decoded images; each request completes on the next poll.
/// Unknown identifiers complete with [`TextureError::NotFound`].
#[derive(Debug, Default)]
pub struct MemoryTextureLoader {
    images: HashMap<String, TextureImage>,
    pending: Vec<(TextureTicket, String)>,
}

impl MemoryTextureLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image(mut self, identifier: impl Into<String>, image: TextureImage) -> Self {
        self.images.insert(identifier.into(), image);
        self
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

impl TextureLoader for MemoryTextureLoader {
    fn request(&mut self, ticket: TextureTicket, identifier: &str) {
        self.pending.push((ticket, identifier.to_string()));
    }

    fn poll(&mut self) -> Vec<TextureCompletion> {
        self.pending
            .drain(..)
            .map(|(ticket, identifier)| {
                let result = self
                    .images
                    .get(&identifier)
                    .cloned()
                    .ok_or_else(|| TextureError::NotFound(identifier.clone()));
                TextureCompletion {
                    ticket,
                    identifier,
                    result,
                }
            })
            .collect()
    }
}
