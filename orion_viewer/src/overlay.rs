//! Dialogue panel rendered as a CPU-rasterized glyph texture on a screen
//! quad, anchored to the bottom-left corner of the window.

use std::borrow::Cow;

use anyhow::{Result, ensure};
use bytemuck::{Pod, Zeroable, cast_slice};
use font8x8::legacy::BASIC_LEGACY;
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;

pub const PANEL_WIDTH: u32 = 576;
pub const PANEL_HEIGHT: u32 = 96;
const PANEL_PADDING_X: u32 = 8;
const PANEL_PADDING_Y: u32 = 8;
const PANEL_MARGIN: f32 = 16.0;

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct QuadVertex {
    pub position: [f32; 2],
    pub uv: [f32; 2],
}

pub const QUAD_INDICES: [u16; 6] = [0, 1, 2, 2, 1, 3];

pub struct TextureUpload<'a> {
    data: Cow<'a, [u8]>,
    bytes_per_row: u32,
}

impl<'a> TextureUpload<'a> {
    pub fn pixels(&self) -> &[u8] {
        &self.data
    }

    pub fn bytes_per_row(&self) -> u32 {
        self.bytes_per_row
    }
}

/// Pad RGBA rows out to the wgpu copy alignment when the natural row stride
/// does not already satisfy it.
pub fn prepare_rgba_upload<'a>(width: u32, height: u32, data: &'a [u8]) -> Result<TextureUpload<'a>> {
    ensure!(width > 0 && height > 0, "texture has no dimensions");
    let row_bytes = 4usize * width as usize;
    let alignment = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT as usize;
    ensure!(
        data.len() >= row_bytes * height as usize,
        "texture buffer ({}) smaller than {}x{} RGBA ({})",
        data.len(),
        width,
        height,
        row_bytes * height as usize
    );

    if row_bytes % alignment == 0 && data.len() == row_bytes * height as usize {
        return Ok(TextureUpload {
            data: Cow::Borrowed(data),
            bytes_per_row: row_bytes as u32,
        });
    }

    let padded_row_bytes = row_bytes.div_ceil(alignment) * alignment;
    let mut buffer = vec![0u8; padded_row_bytes * height as usize];
    for row in 0..height as usize {
        let src_offset = row * row_bytes;
        let dst_offset = row * padded_row_bytes;
        buffer[dst_offset..dst_offset + row_bytes]
            .copy_from_slice(&data[src_offset..src_offset + row_bytes]);
    }

    Ok(TextureUpload {
        data: Cow::Owned(buffer),
        bytes_per_row: padded_row_bytes as u32,
    })
}

pub struct TextOverlay {
    texture: wgpu::Texture,
    _view: wgpu::TextureView,
    _sampler: wgpu::Sampler,
    bind_group: wgpu::BindGroup,
    vertex_buffer: wgpu::Buffer,
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    dirty: bool,
    visible: bool,
}

impl TextOverlay {
    const GLYPH_WIDTH: u32 = 8;
    const GLYPH_HEIGHT: u32 = 8;
    const LINE_SPACING: u32 = 2;
    const FG_COLOR: [u8; 4] = [255, 255, 255, 240];
    const BG_COLOR: [u8; 4] = [0, 0, 0, 96];

    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        bind_group_layout: &wgpu::BindGroupLayout,
        window_size: PhysicalSize<u32>,
    ) -> Result<Self> {
        let extent = wgpu::Extent3d {
            width: PANEL_WIDTH,
            height: PANEL_HEIGHT,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("guide-overlay-texture"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let texture_view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("guide-overlay-sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("guide-overlay-bind-group"),
            layout: bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&texture_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });

        let mut pixels = vec![0u8; (PANEL_WIDTH * PANEL_HEIGHT * 4) as usize];
        Self::fill_background(&mut pixels);

        let upload = prepare_rgba_upload(PANEL_WIDTH, PANEL_HEIGHT, &pixels)?;
        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            upload.pixels(),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(upload.bytes_per_row()),
                rows_per_image: Some(PANEL_HEIGHT),
            },
            extent,
        );

        let vertex_buffer = Self::create_vertex_buffer(device, window_size);

        Ok(Self {
            texture,
            _view: texture_view,
            _sampler: sampler,
            bind_group,
            vertex_buffer,
            width: PANEL_WIDTH,
            height: PANEL_HEIGHT,
            pixels,
            dirty: false,
            visible: false,
        })
    }

    fn fill_background(pixels: &mut [u8]) {
        for chunk in pixels.chunks_exact_mut(4) {
            chunk.copy_from_slice(&Self::BG_COLOR);
        }
    }

    fn create_vertex_buffer(
        device: &wgpu::Device,
        window_size: PhysicalSize<u32>,
    ) -> wgpu::Buffer {
        let vertices = Self::vertex_positions(window_size);
        device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("guide-overlay-vertices"),
            contents: cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        })
    }

    fn vertex_positions(window_size: PhysicalSize<u32>) -> [QuadVertex; 4] {
        let win_width = window_size.width.max(1) as f32;
        let win_height = window_size.height.max(1) as f32;
        let x = PANEL_MARGIN;
        let y = win_height - PANEL_MARGIN - PANEL_HEIGHT as f32;

        let left = (x / win_width) * 2.0 - 1.0;
        let right = ((x + PANEL_WIDTH as f32) / win_width) * 2.0 - 1.0;
        let top = 1.0 - (y / win_height) * 2.0;
        let bottom = 1.0 - ((y + PANEL_HEIGHT as f32) / win_height) * 2.0;

        [
            QuadVertex {
                position: [left, top],
                uv: [0.0, 0.0],
            },
            QuadVertex {
                position: [right, top],
                uv: [1.0, 0.0],
            },
            QuadVertex {
                position: [left, bottom],
                uv: [0.0, 1.0],
            },
            QuadVertex {
                position: [right, bottom],
                uv: [1.0, 1.0],
            },
        ]
    }

    pub fn update_layout(&mut self, device: &wgpu::Device, window_size: PhysicalSize<u32>) {
        self.vertex_buffer = Self::create_vertex_buffer(device, window_size);
    }

    pub fn max_columns(&self) -> usize {
        (self.width.saturating_sub(PANEL_PADDING_X * 2) / Self::GLYPH_WIDTH) as usize
    }

    pub fn set_lines(&mut self, lines: &[String]) {
        Self::fill_background(&mut self.pixels);

        let max_cols = self.max_columns();
        let row_stride = Self::GLYPH_HEIGHT + Self::LINE_SPACING;
        let max_rows =
            (self.height.saturating_sub(PANEL_PADDING_Y * 2) / row_stride) as usize;

        for (row_idx, line) in lines.iter().take(max_rows).enumerate() {
            let glyph_row = PANEL_PADDING_Y + row_idx as u32 * row_stride;
            for (col_idx, ch) in line.chars().take(max_cols).enumerate() {
                let glyph = glyph_for_char(ch);
                let glyph_col = PANEL_PADDING_X + col_idx as u32 * Self::GLYPH_WIDTH;
                for (y_offset, bits) in glyph.iter().enumerate() {
                    let y = glyph_row + y_offset as u32;
                    if y >= self.height {
                        continue;
                    }
                    for x_bit in 0..Self::GLYPH_WIDTH {
                        if (bits >> x_bit) & 0x01 == 0 {
                            continue;
                        }
                        let x = glyph_col + x_bit;
                        if x >= self.width {
                            continue;
                        }
                        let idx = ((y * self.width + x) * 4) as usize;
                        self.pixels[idx..idx + 4].copy_from_slice(&Self::FG_COLOR);
                    }
                }
            }
        }

        self.dirty = true;
        self.visible = lines.iter().any(|line| !line.is_empty());
    }

    pub fn upload(&mut self, queue: &wgpu::Queue) {
        if !self.dirty {
            return;
        }
        let upload = match prepare_rgba_upload(self.width, self.height, &self.pixels) {
            Ok(upload) => upload,
            Err(err) => {
                log::warn!(
                    "overlay upload failed ({}x{}): {err}",
                    self.width,
                    self.height
                );
                return;
            }
        };
        let extent = wgpu::Extent3d {
            width: self.width,
            height: self.height,
            depth_or_array_layers: 1,
        };
        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            upload.pixels(),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(upload.bytes_per_row()),
                rows_per_image: Some(self.height),
            },
            extent,
        );
        self.dirty = false;
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }

    pub fn vertex_buffer(&self) -> &wgpu::Buffer {
        &self.vertex_buffer
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }
}

fn glyph_for_char(ch: char) -> [u8; 8] {
    let index = ch as usize;
    if index < BASIC_LEGACY.len() {
        BASIC_LEGACY[index]
    } else {
        BASIC_LEGACY[b'?' as usize]
    }
}

/// Split a message into panel lines, breaking on whitespace where possible.
pub fn wrap_message(message: &str, max_cols: usize) -> Vec<String> {
    if max_cols == 0 {
        return Vec::new();
    }
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in message.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
        } else if current.chars().count() + 1 + word.chars().count() <= max_cols {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        }
        while current.chars().count() > max_cols {
            let head: String = current.chars().take(max_cols).collect();
            let tail: String = current.chars().skip(max_cols).collect();
            lines.push(head);
            current = tail;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod overlay_tests {
    use super::*;

    #[test]
    fn wrap_breaks_on_word_boundaries() {
        let lines = wrap_message("the quick brown fox jumps over", 12);
        assert_eq!(lines, vec!["the quick", "brown fox", "jumps over"]);
    }

    #[test]
    fn wrap_splits_oversized_words() {
        let lines = wrap_message("abcdefghij", 4);
        assert_eq!(lines, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn wrap_of_empty_message_is_empty() {
        assert!(wrap_message("", 20).is_empty());
        assert!(wrap_message("hello", 0).is_empty());
    }

    #[test]
    fn aligned_rows_upload_without_padding() {
        let width = 64u32;
        let height = 2u32;
        let data = vec![0u8; (width * height * 4) as usize];
        let upload = prepare_rgba_upload(width, height, &data).expect("upload");
        assert_eq!(upload.bytes_per_row(), width * 4);
        assert_eq!(upload.pixels().len(), data.len());
    }

    #[test]
    fn unaligned_rows_are_padded_to_the_copy_alignment() {
        let width = 30u32;
        let height = 3u32;
        let data = vec![255u8; (width * height * 4) as usize];
        let upload = prepare_rgba_upload(width, height, &data).expect("upload");
        assert_eq!(
            upload.bytes_per_row() % wgpu::COPY_BYTES_PER_ROW_ALIGNMENT,
            0
        );
        assert!(upload.pixels().len() >= data.len());
    }
}
