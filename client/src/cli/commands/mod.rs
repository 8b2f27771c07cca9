mod color;
mod connection;
mod lights;
mod rooms;

pub use color::convert_color;
pub use connection::{connect, status};
pub use lights::{list_lights, set_light, toggle_lights};
pub use rooms::{
    create_room, delete_room, edit_room, list_room_classes, list_rooms, set_room, toggle_rooms,
};
