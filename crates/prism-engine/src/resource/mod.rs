//! Typed resource handles.
//!
//! A [`Resource`] wraps a [`prism_value::Value`] payload whose shape is fixed
//! by its [`ResourceKind`]. Mutation goes through path-addressed `set`, which
//! marks the resource dirty; GPU upload is deferred to the next draw that
//! includes it.

mod handle;
pub mod image;
mod kind;
mod shape;

pub use handle::{Resource, ResourceId};
pub use image::{image_value, Filter, ImageDesc, SamplerImages, Wrap, CUBE_FACES};
pub use kind::ResourceKind;

#[cfg(test)]
mod tests {
    use prism_value::{PathError, Value};

    use super::*;
    use crate::error::Error;

    fn lights() -> Resource {
        Resource::uniforms(Value::object([(
            "u_Lights",
            Value::array([Value::object([
                ("direction", Value::from([0, 0, 1])),
                ("strength", Value::from(1)),
                ("color", Value::from([1, 1, 1])),
            ])]),
        )]))
        .unwrap()
    }

    fn pixel(rgba: [u8; 4]) -> Value {
        image_value(1, 1, rgba.to_vec())
    }

    #[test]
    fn set_updates_only_addressed_field() {
        let mut r = lights();
        r.set("u_Lights[0].color", [0, 0, 0]).unwrap();

        assert_eq!(r.get("u_Lights[0].color").unwrap(), &Value::from([0, 0, 0]));
        assert_eq!(r.get("u_Lights[0].direction").unwrap(), &Value::from([0, 0, 1]));
        assert_eq!(r.get("u_Lights[0].strength").unwrap(), &Value::from(1));
    }

    #[test]
    fn set_is_chainable_and_bumps_version() {
        let mut r = lights();
        r.mark_clean();
        r.set("u_Lights[0].strength", 2)
            .unwrap()
            .set("u_Lights[0].color", [0.5, 0.5, 0.5])
            .unwrap();
        assert_eq!(r.version(), 2);
        assert!(r.is_dirty());
    }

    #[test]
    fn get_does_not_touch_dirty_flag() {
        let r = lights();
        r.mark_clean();
        r.get("u_Lights[0].color").unwrap();
        assert!(!r.is_dirty());
    }

    #[test]
    fn new_resources_start_dirty_with_unique_ids() {
        let a = lights();
        let b = lights();
        assert!(a.is_dirty());
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn path_errors_propagate_unchanged() {
        let mut r = lights();
        r.mark_clean();
        let before = r.payload().clone();

        let e = r.set("u_Lights[0].color]", [0, 0, 0]).unwrap_err();
        assert!(matches!(e, Error::Path(PathError::Syntax { .. })));

        let e = r.set("u_Lights[5].color", [0, 0, 0]).unwrap_err();
        assert!(matches!(e, Error::Path(PathError::NotFound { .. })));

        assert_eq!(r.payload(), &before);
        assert!(!r.is_dirty());
        assert_eq!(r.version(), 0);
    }

    #[test]
    fn shape_violation_is_rolled_back() {
        let mut r = lights();
        let before = r.payload().clone();
        let e = r.set("u_Lights[0].color", "red").unwrap_err();
        assert!(matches!(e, Error::ResourceShape { kind: ResourceKind::Uniform, .. }));
        assert_eq!(r.payload(), &before);
    }

    #[test]
    fn rejected_append_is_popped() {
        let mut r = lights();
        let before = r.payload().clone();
        assert!(r.set("u_Lights[1]", "not a light").is_err());
        assert_eq!(r.payload(), &before);

        let light = r.get("u_Lights[0]").unwrap().clone();
        r.set("u_Lights[1]", light).unwrap();
        assert_eq!(r.get("u_Lights").unwrap().as_array().map(<[Value]>::len), Some(2));
    }

    #[test]
    fn vertex_data_shape() {
        assert!(Resource::vertex_data(Value::object([("position", Value::from([0.0, 1.0, 2.0]))])).is_ok());
        assert!(matches!(
            Resource::vertex_data(Value::object(Vec::<(&str, Value)>::new())),
            Err(Error::ResourceShape { .. })
        ));
        assert!(matches!(
            Resource::vertex_data(Value::object([("position", Value::from("xyz"))])),
            Err(Error::ResourceShape { .. })
        ));
        assert!(Resource::vertex_data(Value::from([1, 2, 3])).is_err());
    }

    #[test]
    fn index_data_shape() {
        let mut r = Resource::index_data([0, 1, 2]).unwrap();
        assert!(Resource::index_data([0.5]).is_err());
        assert!(Resource::index_data([-1]).is_err());
        assert!(Resource::index_data(Value::object([("i", Value::from(0))])).is_err());

        r.replace([2, 1, 0, 3]).unwrap();
        assert_eq!(r.payload(), &Value::from([2, 1, 0, 3]));
        assert!(r.replace([1.5]).is_err());
        assert_eq!(r.payload(), &Value::from([2, 1, 0, 3]));
    }

    #[test]
    fn texture_shape() {
        assert!(Resource::textures(Value::object([("u_Albedo", pixel([255, 0, 0, 255]))])).is_ok());

        let faces: Vec<Value> = (0..CUBE_FACES).map(|_| pixel([0, 0, 0, 255])).collect();
        assert!(Resource::textures(Value::object([("u_Env", Value::Array(faces.clone()))])).is_ok());

        let five = Value::Array(faces[..5].to_vec());
        assert!(Resource::textures(Value::object([("u_Env", five)])).is_err());

        let short = Value::object([
            ("width", Value::from(2)),
            ("height", Value::from(2)),
            ("data", Value::Bytes(vec![0; 4])),
        ]);
        assert!(matches!(
            Resource::textures(Value::object([("u_Albedo", short)])),
            Err(Error::ResourceShape { kind: ResourceKind::Texture, .. })
        ));
    }

    #[test]
    fn huge_image_size_is_a_shape_error() {
        let huge = Value::object([
            ("width", Value::from(u32::MAX)),
            ("height", Value::from(u32::MAX)),
            ("data", Value::Bytes(Vec::new())),
        ]);
        assert!(matches!(
            Resource::textures(Value::object([("u_A", huge)])),
            Err(Error::ResourceShape { kind: ResourceKind::Texture, .. })
        ));
    }

    #[test]
    fn cubemap_faces_must_be_square() {
        let face = image_value(2, 1, vec![0; 8]);
        let faces = Value::Array(vec![face; CUBE_FACES]);
        assert!(matches!(
            Resource::textures(Value::object([("u_Env", faces)])),
            Err(Error::ResourceShape { kind: ResourceKind::Texture, .. })
        ));
    }

    #[test]
    fn image_descriptor_options() {
        let v = Value::object([
            ("width", Value::from(1)),
            ("height", Value::from(1)),
            ("data", Value::from([1, 2, 3, 4])),
            ("filter", Value::from("nearest")),
            ("wrap", Value::from("repeat")),
        ]);
        let desc = ImageDesc::from_value(&v).unwrap();
        assert_eq!(&desc.pixels[..], &[1u8, 2, 3, 4][..]);
        assert_eq!(desc.filter, Filter::Nearest);
        assert_eq!(desc.wrap, Wrap::Repeat);

        let mut bad = v.clone();
        bad.set("filter", Value::from("cubic")).unwrap();
        assert!(ImageDesc::from_value(&bad).is_err());
    }

    #[test]
    fn uniform_rejects_mixed_arrays() {
        let mixed = Value::array([Value::from(1), Value::object([("a", Value::from(1))])]);
        assert!(Resource::uniforms(Value::object([("u_X", mixed)])).is_err());
        assert!(Resource::uniforms(Value::object([("u_X", Value::from("s"))])).is_err());
    }
}
