use iris_client_rs::{hex_to_hsb, hsb_to_hex, is_hex_color};

pub fn convert_color(hex: &str) {
    if !is_hex_color(hex) {
        println!("'{hex}' is not a #rrggbb color, the bridge would receive hue 0 and sat 0");
    }
    let color = hex_to_hsb(hex);
    println!("hue: {}, sat: {}", color.hue, color.sat);
    println!(
        "full brightness: {}",
        hsb_to_hex(color.hue, color.sat, 254)
    );
}
