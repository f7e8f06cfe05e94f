mod coordinator;
mod frame_actions;
mod keyframed;
mod procedural;
mod sequential;
mod skeleton;
mod track;

pub use coordinator::*;
pub use frame_actions::*;
pub use keyframed::*;
pub use procedural::*;
pub use sequential::*;
pub use skeleton::*;
pub use track::*;


#[cfg(test)]
mod frame_actions_tests;



#[cfg(test)]
mod procedural_tests;

#[cfg(test)]
mod sequential_tests;
