use colored::*;

use crate::terminal::print;

const BANNER_0: &str = r#"
         ██████  █     █░▓█████ ▓█████  ██▓███   ██▀███
       ▒██    ▒ ▓█░ █ ░█░▓█   ▀ ▓█   ▀ ▓██░  ██▒▓██ ▒ ██▒
       ░ ▓██▄   ▒█░ █ ░█ ▒███   ▒███   ▓██░ ██▓▒▓██ ░▄█ ▒
         ▒   ██▒░█░ █ ░█ ▒▓█  ▄ ▒▓█  ▄ ▒██▄█▓▒ ▒▒██▀▀█▄
       ▒██████▒▒░░██▒██▓ ░▒████▒░▒████▒▒██▒ ░  ░░██▓ ▒██▒
       ▒ ▒▓▒ ▒ ░░ ▓░▒ ▒  ░░ ▒░ ░░░ ▒░ ░▒▓▒░ ░  ░░ ▒▓ ░▒▓░
       ░ ░▒  ░ ░  ▒ ░ ░   ░ ░  ░ ░ ░  ░░▒ ░       ░▒ ░ ▒░
       ░  ░  ░    ░   ░     ░      ░   ░░         ░░   ░
             ░      ░       ░  ░   ░  ░            ░
"#;

const BANNER_1: &str = r#"
      ___       ___       ___       ___       ___       ___
     /\  \     /\__\     /\  \     /\  \     /\  \     /\  \
    /::\  \   /:/\__\   /::\  \   /::\  \   /::\  \   /::\  \
   /\:\:\__\ /:/:/\__\ /::\:\__\ /::\:\__\ /::\:\__\ /::\:\__\
   \:\:\/__/ \::/:/  / \:\:\/  / \:\:\/  / \/\::/  / \;:::/  /
    \::/  /   \::/  /   \:\/  /   \:\/  /     \/__/   |:\/__/
     \/__/     \/__/     \/__/     \/__/               \|__|
"#;

const BANNER_2: &str = r#"
     _____ _    _ _____ _____ ____  ____
    / ____| |  | | ____| ____|  _ \|  _ \
   | (___ | |  | |  _| |  _| | |_) | |_) |
    \___ \| |/\| | |___| |___|  __/|  _ <
    ____) \  /\  /_____|_____|_|   |_| \_\
   |_____/ \/  \/
"#;

pub fn print() {
    let output: ColoredString = match rand::random_range(0..3u8) {
        0 => BANNER_0.red(),
        1 => BANNER_1.green(),
        _ => BANNER_2.truecolor(255, 165, 0),
    };
    print::print(&output.to_string());
}
