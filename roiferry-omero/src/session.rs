// Copyright (c) 2025, Tom Ouellette
// Licensed under the MIT License

use anyhow::{Context, Result, anyhow};
use reqwest::Client;
use serde_json::{Value, json};
use tokio::runtime::Runtime;

use roiferry_core::config::ServerConfig;
use roiferry_core::constant::{ALL_GROUPS, EXPERIMENTER_TYPE, IMAGE_TYPE, ROI_TYPE};
use roiferry_core::error::RoiFerryError;
use roiferry_core::roi::Shape;
use roiferry_core::session::{Connect, Image, Region, Session, WriteContext};

use crate::request::{self, API_ROOT};

// Number of ROIs requested per page
const ROI_PAGE_SIZE: usize = 200;

/// Opens OMERO.web sessions for one server and identity
#[derive(Debug, Clone)]
pub struct WebConnector {
    server: ServerConfig,
}

impl WebConnector {
    pub fn new(server: ServerConfig) -> Self {
        Self { server }
    }
}

impl Connect for WebConnector {
    type Session = WebSession;

    fn connect(&self) -> Result<WebSession, RoiFerryError> {
        let username = self.server.username.as_deref().ok_or_else(|| {
            RoiFerryError::ConfigError(format!("No username for {}", self.server.host))
        })?;

        let password = self.server.password.as_deref().ok_or_else(|| {
            RoiFerryError::ConfigError(format!("No password for {}", self.server.host))
        })?;

        WebSession::connect(&self.server.base_url(), username, password).map_err(session_error)
    }

    fn describe(&self) -> String {
        self.server.host.clone()
    }
}

/// An authenticated OMERO.web session
///
/// Requests run on a private single-threaded runtime so the session can be
/// used from synchronous code and logged out from `close`.
pub struct WebSession {
    runtime: Runtime,
    client: Client,
    base_url: String,
    csrf_token: String,
    active_group: i64,
    closed: bool,
}

impl WebSession {
    pub fn connect(base_url: &str, username: &str, password: &str) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("Failed to start runtime")?;

        let client = request::create_http_client()?;
        let base_url = base_url.trim_end_matches('/').to_string();

        let csrf_token = runtime.block_on(async {
            let token = request::fetch_csrf_token(&client, &base_url).await?;
            request::login(&client, &base_url, &token, username, password).await?;
            Ok::<String, anyhow::Error>(token)
        })?;

        Ok(Self {
            runtime,
            client,
            base_url,
            csrf_token,
            active_group: ALL_GROUPS,
            closed: false,
        })
    }

    fn group_query(&self) -> Vec<(&'static str, String)> {
        vec![("group", self.active_group.to_string())]
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/{}/{}", self.base_url, API_ROOT, path)
    }

    fn ensure_open(&self) -> Result<(), RoiFerryError> {
        if self.closed {
            return Err(RoiFerryError::SessionError("Session is closed".to_string()));
        }
        Ok(())
    }
}

impl Session for WebSession {
    fn get_image(&mut self, image_id: i64) -> Result<Image, RoiFerryError> {
        self.ensure_open()?;

        let url = self.api_url(&format!("m/images/{}/", image_id));
        let query = self.group_query();
        let body: Value = self
            .runtime
            .block_on(request::get_json(&self.client, &url, &query))
            .map_err(|err| session_error(err.context(format!("Image {} not found", image_id))))?;

        parse_image(&body).map_err(session_error)
    }

    fn get_thumbnail(&mut self, image_id: i64) -> Result<Vec<u8>, RoiFerryError> {
        self.ensure_open()?;

        let url = format!("{}/webgateway/render_thumbnail/{}/", self.base_url, image_id);
        self.runtime
            .block_on(request::get_bytes(&self.client, &url))
            .map_err(|err| RoiFerryError::ThumbnailError(format!("{:#}", err)))
    }

    fn get_regions(&mut self, image_id: i64) -> Result<Vec<Region>, RoiFerryError> {
        self.ensure_open()?;

        let url = self.api_url(&format!("m/images/{}/rois/", image_id));
        let mut regions: Vec<Region> = Vec::new();

        loop {
            let mut query = self.group_query();
            query.push(("offset", regions.len().to_string()));
            query.push(("limit", ROI_PAGE_SIZE.to_string()));

            let body: Value = self
                .runtime
                .block_on(request::get_json(&self.client, &url, &query))
                .map_err(session_error)?;

            let (page, total) = parse_regions(&body).map_err(session_error)?;
            let fetched = page.len();
            regions.extend(page);

            if fetched == 0 || regions.len() >= total {
                break;
            }
        }

        Ok(regions)
    }

    fn set_active_group(&mut self, group_id: i64) -> Result<(), RoiFerryError> {
        self.ensure_open()?;
        self.active_group = group_id;
        Ok(())
    }

    fn persist(
        &mut self,
        shape: &Shape,
        image: &Image,
        context: Option<&WriteContext>,
    ) -> Result<i64, RoiFerryError> {
        self.ensure_open()?;

        let body = roi_payload(shape, image, context)
            .map_err(|err| RoiFerryError::PersistError(format!("{:#}", err)))?;

        let query: Vec<(&str, String)> = context
            .map(|context| vec![("group", context.group_id.to_string())])
            .unwrap_or_default();

        let url = self.api_url("m/save/");
        let response = self
            .runtime
            .block_on(request::post_json(
                &self.client,
                &url,
                &self.csrf_token,
                &self.base_url,
                &query,
                &body,
            ))
            .map_err(|err| RoiFerryError::PersistError(format!("{:#}", err)))?;

        response
            .get("data")
            .and_then(|data| data.get("@id"))
            .and_then(Value::as_i64)
            .ok_or_else(|| RoiFerryError::PersistError("No ROI id in response".to_string()))
    }

    fn close(&mut self) -> Result<(), RoiFerryError> {
        if self.closed {
            return Ok(());
        }

        self.closed = true;
        self.runtime
            .block_on(request::logout(&self.client, &self.base_url, &self.csrf_token))
            .map_err(session_error)
    }
}

fn session_error(err: anyhow::Error) -> RoiFerryError {
    RoiFerryError::SessionError(format!("{:#}", err))
}

/// Read an image and its owning group from an image response
fn parse_image(body: &Value) -> Result<Image> {
    let data = body.get("data").ok_or_else(|| anyhow!("No image in response"))?;
    let details = data
        .get("omero:details")
        .ok_or_else(|| anyhow!("No ownership details for image"))?;

    let id = |value: Option<&Value>, what: &str| {
        value
            .and_then(|v| v.get("@id"))
            .and_then(Value::as_i64)
            .ok_or_else(|| anyhow!("No {} id for image", what))
    };

    Ok(Image {
        id: id(Some(data), "image")?,
        name: data
            .get("Name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        group_id: id(details.get("group"), "group")?,
        group_name: details
            .get("group")
            .and_then(|group| group.get("Name"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
    })
}

/// Read one page of regions and the total region count
fn parse_regions(body: &Value) -> Result<(Vec<Region>, usize)> {
    let data = body
        .get("data")
        .and_then(Value::as_array)
        .ok_or_else(|| anyhow!("No ROI list in response"))?;

    let regions = data
        .iter()
        .map(|roi| -> Result<Region> {
            let id = roi
                .get("@id")
                .and_then(Value::as_i64)
                .ok_or_else(|| anyhow!("ROI without id"))?;

            let shapes = roi
                .get("shapes")
                .and_then(Value::as_array)
                .map(|shapes| {
                    shapes
                        .iter()
                        .map(|shape| serde_json::from_value::<Shape>(shape.clone()))
                        .collect::<Result<Vec<Shape>, _>>()
                })
                .transpose()
                .with_context(|| format!("Malformed shape in ROI {}", id))?
                .unwrap_or_default();

            Ok(Region { id, shapes })
        })
        .collect::<Result<Vec<Region>>>()?;

    let total = body
        .get("meta")
        .and_then(|meta| meta.get("totalCount"))
        .and_then(Value::as_u64)
        .map(|total| total as usize)
        .unwrap_or(regions.len());

    Ok((regions, total))
}

/// Build a new ROI linked to an image that holds a single shape
fn roi_payload(shape: &Shape, image: &Image, context: Option<&WriteContext>) -> Result<Value> {
    let mut payload = json!({
        "@type": ROI_TYPE,
        "Image": {"@id": image.id, "@type": IMAGE_TYPE},
        "shapes": [serde_json::to_value(shape).context("Failed to serialize shape")?],
    });

    if let Some(context) = context {
        payload["omero:details"] = json!({
            "owner": {"@id": context.user_id, "@type": EXPERIMENTER_TYPE},
        });
    }

    Ok(payload)
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn test_parse_image() {
        let body = json!({
            "data": {
                "@id": 100,
                "@type": IMAGE_TYPE,
                "Name": "slide.svs",
                "omero:details": {
                    "owner": {"@id": 52},
                    "group": {"@id": 409, "Name": "lab"}
                }
            }
        });

        let image = parse_image(&body).unwrap();
        assert_eq!(
            image,
            Image {
                id: 100,
                name: "slide.svs".to_string(),
                group_id: 409,
                group_name: "lab".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_image_without_owner() {
        let body = json!({
            "data": {
                "@id": 100,
                "Name": "slide.svs",
                "omero:details": {"group": {"@id": 409, "Name": "lab"}}
            }
        });

        let image = parse_image(&body).unwrap();
        assert_eq!(image.group_id, 409);
    }

    #[test]
    fn test_parse_image_missing_details() {
        let body = json!({"data": {"@id": 100, "Name": "slide.svs"}});
        assert!(parse_image(&body).is_err());
    }

    #[test]
    fn test_parse_regions() {
        let body = json!({
            "data": [
                {
                    "@id": 1,
                    "shapes": [{
                        "@id": 11,
                        "@type": "http://www.openmicroscopy.org/Schemas/OME/2016-06#Rectangle",
                        "X": 10.0, "Y": 20.0, "Width": 5.0, "Height": 7.0,
                        "Text": "Box"
                    }]
                },
                {"@id": 2}
            ],
            "meta": {"totalCount": 5, "offset": 0, "limit": 2}
        });

        let (regions, total) = parse_regions(&body).unwrap();
        assert_eq!(total, 5);
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].shapes[0].width, Some(5.0));
        assert!(regions[1].shapes.is_empty());
    }

    #[test]
    fn test_roi_payload() {
        let image = Image {
            id: 200,
            name: String::new(),
            group_id: 3,
            group_name: String::new(),
        };
        let shape = Shape::polygon("1,1 2,1 2,2 ").with_text("Tumor");

        let payload = roi_payload(&shape, &image, None).unwrap();
        assert_eq!(payload["Image"]["@id"], json!(200));
        assert_eq!(payload["shapes"][0]["Text"], json!("Tumor"));
        assert!(payload.get("omero:details").is_none());

        let context = WriteContext {
            group_id: 409,
            user_id: 12,
        };
        let payload = roi_payload(&shape, &image, Some(&context)).unwrap();
        assert_eq!(payload["omero:details"]["owner"]["@id"], json!(12));
    }
}
