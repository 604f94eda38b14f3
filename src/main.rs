/*
 *  main.rs
 *
 *  sharpmip - Sharp Memory-in-Pixel display driver
 *  (c) 2020-26 Stuart Hunter
 *
 *  Demo: greeting, scrolling text and VCOM keep-alive on a Linux SBC
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use std::thread::sleep;

use anyhow::{Context, Result};
use env_logger::Env;
use log::{debug, info, warn};

use sharpmip::config;
use sharpmip::demo::{Demo, Step};
use sharpmip::display::{DisplayDriver, DisplayDriverFactory, GlyphTable};

include!(concat!(env!("OUT_DIR"), "/build_info.rs"));

fn main() -> Result<()> {
    let cfg = config::load().context("loading configuration")?;

    let level = cfg.log_level.clone().unwrap_or_else(|| "info".to_string());
    env_logger::Builder::from_env(Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();

    info!("{} v.{} built {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"), BUILD_DATE);

    let font_path = cfg
        .font
        .clone()
        .context("no glyph table configured, pass --font or set `font:` in the config file")?;
    let font = GlyphTable::load(&font_path)
        .with_context(|| format!("loading glyph table {}", font_path.display()))?;

    let display = cfg.display.clone().unwrap_or_default();
    let mut lcd = DisplayDriverFactory::create_from_config(&display)
        .context("opening SHARP memory display")?;

    let vcom_interval = lcd.capabilities().vcom_interval;
    let demo_cfg = cfg.demo.clone().unwrap_or_default();
    let frames = demo_cfg.frames.unwrap_or(0);

    let mut demo = Demo::new(&font, &demo_cfg, vcom_interval);
    let tick = demo.tick();
    debug!("vcom interval {:?}, tick {:?}", vcom_interval, tick);
    demo.intro(&mut lcd).context("drawing greeting")?;

    let mut count: u64 = 0;
    loop {
        sleep(tick);
        match demo.step(&mut lcd).context("demo step")? {
            Step::Moved(row) => debug!("text at row {}", row),
            Step::Toggled => debug!("vcom keep-alive"),
            Step::Idle => {}
        }
        count += 1;
        if frames != 0 && count >= frames {
            info!("{} frames done", count);
            break;
        }
    }

    let (_spi, cs, _delay) = lcd.release().release();
    if let Err(e) = cs.unexport() {
        warn!("could not unexport chip select: {:?}", e);
    }
    Ok(())
}
