// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

//! An in-memory server that behaves like a group-scoped OMERO instance.
//!
//! Image lookups succeed in the owning group or when all groups are
//! visible, region queries only succeed once the session is narrowed to
//! the owning group. Session bookkeeping is recorded so callers can check
//! that connections are released.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};
use std::rc::Rc;

use crate::constant::ALL_GROUPS;
use crate::error::RoiFerryError;
use crate::roi::Shape;
use crate::session::{Connect, Image, Region, Session, WriteContext};

/// A saved region together with the context it was written under
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedRegion {
    pub image_id: i64,
    pub region: Region,
    pub context: Option<WriteContext>,
}

#[derive(Debug, Default)]
struct MemoryState {
    images: BTreeMap<i64, Image>,
    thumbnails: BTreeMap<i64, Vec<u8>>,
    regions: BTreeMap<i64, Vec<Region>>,
    persisted: Vec<PersistedRegion>,
    failing_texts: HashSet<String>,
    refuse_connections: bool,
    next_id: i64,
    open_sessions: usize,
    max_open_sessions: usize,
    opened: usize,
    closed: usize,
}

/// Shared handle to an in-memory server
#[derive(Debug, Clone, Default)]
pub struct MemoryServer {
    state: Rc<RefCell<MemoryState>>,
}

impl MemoryServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an image owned by a group
    pub fn add_image(&self, image_id: i64, name: &str, group_id: i64) {
        let mut state = self.state.borrow_mut();
        state.images.insert(
            image_id,
            Image {
                id: image_id,
                name: name.to_string(),
                group_id,
                group_name: format!("group-{}", group_id),
            },
        );
        state.regions.entry(image_id).or_default();
    }

    /// Attach a single-shape region to an image and return its id
    pub fn add_region(&self, image_id: i64, shape: Shape) -> i64 {
        self.add_region_shapes(image_id, vec![shape])
    }

    /// Attach a region with an arbitrary list of shapes
    pub fn add_region_shapes(&self, image_id: i64, shapes: Vec<Shape>) -> i64 {
        let mut state = self.state.borrow_mut();
        state.next_id += 1;
        let id = state.next_id;
        state
            .regions
            .entry(image_id)
            .or_default()
            .push(Region { id, shapes });
        id
    }

    pub fn set_thumbnail(&self, image_id: i64, bytes: Vec<u8>) {
        self.state.borrow_mut().thumbnails.insert(image_id, bytes);
    }

    /// Make persisting any shape with this label fail
    pub fn fail_persist_for(&self, text: &str) {
        self.state.borrow_mut().failing_texts.insert(text.to_string());
    }

    /// Make every subsequent connection attempt fail
    pub fn refuse_connections(&self, refuse: bool) {
        self.state.borrow_mut().refuse_connections = refuse;
    }

    /// Regions currently attached to an image
    pub fn regions(&self, image_id: i64) -> Vec<Region> {
        self.state
            .borrow()
            .regions
            .get(&image_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Every region saved through a session, in write order
    pub fn persisted(&self) -> Vec<PersistedRegion> {
        self.state.borrow().persisted.clone()
    }

    pub fn open_sessions(&self) -> usize {
        self.state.borrow().open_sessions
    }

    pub fn max_open_sessions(&self) -> usize {
        self.state.borrow().max_open_sessions
    }

    pub fn sessions_opened(&self) -> usize {
        self.state.borrow().opened
    }

    pub fn sessions_closed(&self) -> usize {
        self.state.borrow().closed
    }
}

/// Connects to an in-memory server, optionally sharing bookkeeping with
/// another server so concurrent sessions across both can be observed
#[derive(Debug, Clone)]
pub struct MemoryConnector {
    server: MemoryServer,
    tracker: MemoryServer,
    name: String,
}

impl MemoryConnector {
    pub fn new(server: &MemoryServer, name: &str) -> Self {
        Self {
            server: server.clone(),
            tracker: server.clone(),
            name: name.to_string(),
        }
    }

    /// Record session open/close counts on a separate tracking server
    pub fn tracked_by(mut self, tracker: &MemoryServer) -> Self {
        self.tracker = tracker.clone();
        self
    }
}

impl Connect for MemoryConnector {
    type Session = MemorySession;

    fn connect(&self) -> Result<MemorySession, RoiFerryError> {
        if self.server.state.borrow().refuse_connections {
            return Err(RoiFerryError::SessionError(format!(
                "Connection to {} refused",
                self.name
            )));
        }

        {
            let mut tracker = self.tracker.state.borrow_mut();
            tracker.open_sessions += 1;
            tracker.opened += 1;
            tracker.max_open_sessions = tracker.max_open_sessions.max(tracker.open_sessions);
        }

        Ok(MemorySession {
            server: self.server.clone(),
            tracker: self.tracker.clone(),
            active_group: None,
            closed: false,
        })
    }

    fn describe(&self) -> String {
        self.name.clone()
    }
}

/// A session on an in-memory server
#[derive(Debug)]
pub struct MemorySession {
    server: MemoryServer,
    tracker: MemoryServer,
    active_group: Option<i64>,
    closed: bool,
}

impl MemorySession {
    fn ensure_open(&self) -> Result<(), RoiFerryError> {
        if self.closed {
            return Err(RoiFerryError::SessionError("Session is closed".to_string()));
        }
        Ok(())
    }

    fn visible(&self, image: &Image) -> bool {
        match self.active_group {
            Some(ALL_GROUPS) => true,
            Some(group_id) => group_id == image.group_id,
            None => false,
        }
    }
}

impl Session for MemorySession {
    fn get_image(&mut self, image_id: i64) -> Result<Image, RoiFerryError> {
        self.ensure_open()?;

        let state = self.server.state.borrow();
        state
            .images
            .get(&image_id)
            .filter(|image| self.visible(image))
            .cloned()
            .ok_or(RoiFerryError::ImageNotFoundError(image_id))
    }

    fn get_thumbnail(&mut self, image_id: i64) -> Result<Vec<u8>, RoiFerryError> {
        self.ensure_open()?;

        self.server
            .state
            .borrow()
            .thumbnails
            .get(&image_id)
            .cloned()
            .ok_or_else(|| RoiFerryError::ThumbnailError(format!("No thumbnail for {}", image_id)))
    }

    fn get_regions(&mut self, image_id: i64) -> Result<Vec<Region>, RoiFerryError> {
        self.ensure_open()?;

        let state = self.server.state.borrow();
        let image = state
            .images
            .get(&image_id)
            .ok_or(RoiFerryError::ImageNotFoundError(image_id))?;

        if self.active_group != Some(image.group_id) {
            return Err(RoiFerryError::SessionError(format!(
                "Region query for image {} is not scoped to group {}",
                image_id, image.group_id
            )));
        }

        Ok(state.regions.get(&image_id).cloned().unwrap_or_default())
    }

    fn set_active_group(&mut self, group_id: i64) -> Result<(), RoiFerryError> {
        self.ensure_open()?;
        self.active_group = Some(group_id);
        Ok(())
    }

    fn persist(
        &mut self,
        shape: &Shape,
        image: &Image,
        context: Option<&WriteContext>,
    ) -> Result<i64, RoiFerryError> {
        self.ensure_open()?;

        let mut state = self.server.state.borrow_mut();

        if !state.images.contains_key(&image.id) {
            return Err(RoiFerryError::ImageNotFoundError(image.id));
        }

        if let Some(text) = &shape.text {
            if state.failing_texts.contains(text) {
                return Err(RoiFerryError::PersistError(format!(
                    "Shape '{}' was rejected",
                    text
                )));
            }
        }

        state.next_id += 1;
        let region = Region {
            id: state.next_id,
            shapes: vec![Shape {
                id: Some(state.next_id),
                ..shape.clone()
            }],
        };

        state.regions.entry(image.id).or_default().push(region.clone());
        state.persisted.push(PersistedRegion {
            image_id: image.id,
            region: region.clone(),
            context: context.copied(),
        });

        Ok(region.id)
    }

    fn close(&mut self) -> Result<(), RoiFerryError> {
        if !self.closed {
            self.closed = true;
            let mut tracker = self.tracker.state.borrow_mut();
            tracker.open_sessions -= 1;
            tracker.closed += 1;
        }
        Ok(())
    }
}
