//! Serialize `glam` points as `{ "x": .., "y": .. }` objects
//!
//! Use with `#[serde(with = "crate::serde_point")]` on `DVec2` fields.

use glam::DVec2;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Serialize, Deserialize)]
struct Xy {
    x: f64,
    y: f64,
}

pub fn serialize<S>(p: &DVec2, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    Xy { x: p.x, y: p.y }.serialize(serializer)
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<DVec2, D::Error>
where
    D: Deserializer<'de>,
{
    let xy = Xy::deserialize(deserializer)?;
    Ok(DVec2::new(xy.x, xy.y))
}

#[cfg(test)]
mod tests {
    use glam::DVec2;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Holder {
        #[serde(with = "crate::serde_point")]
        p: DVec2,
    }

    #[test]
    fn test_point_shape() {
        let json = serde_json::to_string(&Holder { p: DVec2::new(1.5, -2.0) }).unwrap();
        assert_eq!(json, r#"{"p":{"x":1.5,"y":-2.0}}"#);
        let back: Holder = serde_json::from_str(&json).unwrap();
        assert_eq!(back.p, DVec2::new(1.5, -2.0));
    }
}
