/// Implements [`LayerTrait`](crate::layers::base::LayerTrait) for a layer
/// that keeps its shared state in a `LayerProperties` field.
///
/// ```ignore
/// impl LayerTrait for LabelOverlay {
///     impl_layer_trait!(properties);
/// }
/// ```
#[macro_export]
macro_rules! impl_layer_trait {
    ($props:ident) => {
        fn id(&self) -> &$crate::layers::base::LayerId {
            &self.$props.id
        }

        fn layer_type(&self) -> $crate::layers::base::LayerType {
            self.$props.layer_type
        }

        fn z_index(&self) -> i32 {
            self.$props.z_index
        }

        fn opacity(&self) -> f32 {
            self.$props.opacity
        }

        fn set_opacity(&mut self, opacity: f32) {
            self.$props.opacity = opacity.clamp(0.0, 1.0);
        }

        fn is_visible(&self) -> bool {
            self.$props.visible && self.$props.opacity > 0.0
        }

        fn set_visible(&mut self, visible: bool) {
            self.$props.visible = visible;
        }

        fn is_interactive(&self) -> bool {
            self.$props.interactive && self.$props.visible
        }
    };
}
