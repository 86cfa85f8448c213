// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use std::ops::{Deref, DerefMut};

use crate::error::RoiFerryError;
use crate::roi::Shape;
use crate::ut::track::warn_log;

pub mod memory;

/// An image located on a server along with the group that owns it
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    pub id: i64,
    pub name: String,
    pub group_id: i64,
    pub group_name: String,
}

/// A region of interest holding one or more shapes
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub id: i64,
    pub shapes: Vec<Shape>,
}

impl Region {
    /// The shape considered authoritative for the region
    pub fn primary_shape(&self) -> Option<&Shape> {
        self.shapes.first()
    }
}

/// The group and user a write is executed as
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WriteContext {
    pub group_id: i64,
    pub user_id: i64,
}

/// An authenticated connection to an imaging-data server
pub trait Session {
    /// Look up an image visible in the active group
    fn get_image(&mut self, image_id: i64) -> Result<Image, RoiFerryError>;

    /// Fetch the encoded preview thumbnail of an image
    fn get_thumbnail(&mut self, image_id: i64) -> Result<Vec<u8>, RoiFerryError>;

    /// List the regions attached to an image within the active group
    fn get_regions(&mut self, image_id: i64) -> Result<Vec<Region>, RoiFerryError>;

    /// Change the group subsequent calls are scoped to (-1 for all groups)
    fn set_active_group(&mut self, group_id: i64) -> Result<(), RoiFerryError>;

    fn set_write_context(&mut self, group_id: i64, user_id: i64) -> WriteContext {
        WriteContext { group_id, user_id }
    }

    /// Save a shape as a new region linked to the image and return its id
    fn persist(
        &mut self,
        shape: &Shape,
        image: &Image,
        context: Option<&WriteContext>,
    ) -> Result<i64, RoiFerryError>;

    /// Log out and release the connection
    fn close(&mut self) -> Result<(), RoiFerryError>;
}

/// Opens sessions against one server with a fixed identity
pub trait Connect {
    type Session: Session;

    fn connect(&self) -> Result<Self::Session, RoiFerryError>;

    /// Human readable server description used in logs
    fn describe(&self) -> String;

    /// Open a session that is closed when the guard is dropped
    fn open(&self) -> Result<ScopedSession<Self::Session>, RoiFerryError> {
        Ok(ScopedSession::new(self.connect()?, self.describe()))
    }
}

/// A session guard that closes the session on every exit path
pub struct ScopedSession<S: Session> {
    session: S,
    server: String,
}

impl<S: Session> ScopedSession<S> {
    pub fn new(session: S, server: String) -> Self {
        Self { session, server }
    }
}

impl<S: Session> Deref for ScopedSession<S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.session
    }
}

impl<S: Session> DerefMut for ScopedSession<S> {
    fn deref_mut(&mut self) -> &mut S {
        &mut self.session
    }
}

impl<S: Session> Drop for ScopedSession<S> {
    fn drop(&mut self) {
        if let Err(err) = self.session.close() {
            warn_log(&format!("Failed to close session on {}. {}", self.server, err));
        }
    }
}
