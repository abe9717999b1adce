use pulsecore::reflect::{Param, ReflectionRegistry, TypeBuilder, TypeRegistration};

/// 2D position exposed to graphs through reflection as `Transform`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transform {
    pub x: f32,
    pub y: f32,
}

impl Transform {
    pub const TYPE: &'static str = "Transform";

    pub fn translate(&mut self, dx: f32, dy: f32) {
        self.x += dx;
        self.y += dy;
    }

    pub fn scale(&mut self, factor: f32) {
        self.x *= factor;
        self.y *= factor;
    }

    pub fn registration() -> TypeRegistration {
        TypeBuilder::new(Self::TYPE, Transform::default)
            .property_rw("x", |t: &Transform| t.x, |t: &mut Transform, v: f32| t.x = v)
            .property_rw("y", |t: &Transform| t.y, |t: &mut Transform, v: f32| t.y = v)
            .method("move", &[Param::of::<f32>(), Param::of::<f32>()], |t, args| {
                t.translate(args.float(0)?, args.float(1)?);
                Ok(())
            })
            .method("scale", &[Param::with_default(1.0f32)], |t, args| {
                t.scale(args.float(0)?);
                Ok(())
            })
            .method("reset", &[], |t, _| {
                *t = Transform::default();
                Ok(())
            })
            .build()
    }
}

/// Reflection registry holding every type this crate exposes
pub fn builtin_reflection() -> ReflectionRegistry {
    let mut registry = ReflectionRegistry::new();
    registry.register(Transform::registration());
    registry
}
