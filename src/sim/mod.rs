//! Deterministic throw simulation
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep physics, variable-rate frame sampling
//! - Seeded RNG only (sound bank selection)
//! - No rendering or platform dependencies

pub mod body;
pub mod dilation;
pub mod pointer;
pub mod probe;
pub mod state;
pub mod throw;
pub mod tick;

pub use body::{BodyProxy, Pose, SimBody};
pub use dilation::{DilationPhase, DilationSequence};
pub use pointer::{OrthoPointer, PointerProjector, Ray};
pub use probe::{FlatScene, GroundProbe, Surface, SurfaceHit};
pub use state::{Event, Outcome, Piece, PieceState, SfxCue, Target};
pub use throw::ThrowEngine;
