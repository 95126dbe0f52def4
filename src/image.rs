use crate::bundle::InvocationImage;
use log::debug;
use thiserror::Error;

const DOCKER_IMAGE_TYPE: &str = "docker";

#[derive(Error, Debug)]
pub enum Error {
    #[error("cannot get bundle name from invocationImages: {0}")]
    NoDockerImage(String),
}

/// Derive the bundle name from the first docker invocation image.
///
/// The tag is removed, and then `registry_prefix` if the image starts with it:
/// `cnabquickstartstest.azurecr.io/myapp:1.0` becomes `myapp`.
pub fn bundle_name(images: &[InvocationImage], registry_prefix: &str) -> Result<String, Error> {
    let image = images
        .iter()
        .find(|image| image.image_type == DOCKER_IMAGE_TYPE)
        .ok_or_else(|| Error::NoDockerImage(describe(images)))?;

    debug!("Using invocation image {} for the bundle name", image.image);

    let repository = image.image.split(':').next().unwrap_or_default();
    Ok(repository
        .strip_prefix(registry_prefix)
        .unwrap_or(repository)
        .to_string())
}

fn describe(images: &[InvocationImage]) -> String {
    let images = images
        .iter()
        .map(|image| format!("{} ({})", image.image, image.image_type))
        .collect::<Vec<_>>();
    format!("[{}]", images.join(", "))
}
