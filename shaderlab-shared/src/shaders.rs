//! Embedded GLSL sources for the particle pipeline.
//! Templates are owned by the native module; user defaults seed the editor slots.

pub const COMMON_UNIFORMS: &str = include_str!("../shaders/common_uniforms.glsl");
pub const SIMULATION_VERT: &str = include_str!("../shaders/simulation_vs.glsl");
pub const SIMULATION_FRAG_TEMPLATE: &str = include_str!("../shaders/simulation_fs.glsl");
pub const SHADE_VERT_TEMPLATE: &str = include_str!("../shaders/shade_vs.glsl");
pub const SHADE_FRAG_TEMPLATE: &str = include_str!("../shaders/shade_fs.glsl");

pub const USER_DEFAULT_COMMON: &str = include_str!("../shaders/user_default_common.glsl");
pub const USER_DEFAULT_SIMULATION: &str = include_str!("../shaders/user_default_simulation.glsl");
pub const USER_DEFAULT_VERTEX: &str = include_str!("../shaders/user_default_vertex.glsl");
pub const USER_DEFAULT_FRAGMENT: &str = include_str!("../shaders/user_default_fragment.glsl");

/// Number of user-editable shader slots.
pub const SHADER_SLOT_COUNT: usize = 4;

/// User shader slots, in the order the editor tabs and scene files use them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderSlot {
    /// Helper code prepended to every program.
    Common = 0,
    Simulation = 1,
    Vertex = 2,
    Fragment = 3,
}

impl ShaderSlot {
    pub const ALL: [ShaderSlot; SHADER_SLOT_COUNT] = [
        ShaderSlot::Common,
        ShaderSlot::Simulation,
        ShaderSlot::Vertex,
        ShaderSlot::Fragment,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Common => "common",
            Self::Simulation => "simulation",
            Self::Vertex => "vertex",
            Self::Fragment => "fragment",
        }
    }

    /// Factory source for this slot.
    pub fn default_source(self) -> &'static str {
        match self {
            Self::Common => USER_DEFAULT_COMMON,
            Self::Simulation => USER_DEFAULT_SIMULATION,
            Self::Vertex => USER_DEFAULT_VERTEX,
            Self::Fragment => USER_DEFAULT_FRAGMENT,
        }
    }

    /// Template and insertion marker for program slots. `Common` has none.
    pub fn template(self) -> Option<(&'static str, &'static str)> {
        match self {
            Self::Common => None,
            Self::Simulation => Some((SIMULATION_FRAG_TEMPLATE, "{{simulation}}")),
            Self::Vertex => Some((SHADE_VERT_TEMPLATE, "{{vertex}}")),
            Self::Fragment => Some((SHADE_FRAG_TEMPLATE, "{{fragment}}")),
        }
    }
}
