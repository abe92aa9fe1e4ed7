use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use anyhow::{Context, Result};
use image::imageops::FilterType;
use image::RgbaImage;
use tracing::{debug, warn};
use wgpu::util::{DeviceExt, TextureDataOrder};

use crate::compile::ShaderInterface;
use crate::types::TextureSource;

/// Opaque blue, visible enough to make a stuck load obvious.
const PLACEHOLDER_PIXEL: [u8; 4] = [0, 0, 255, 255];

const TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

/// The cube face texture and its placeholder-then-replace protocol.
///
/// A bindable bind group exists from the moment of construction; if an image
/// load was requested it is decoded on a worker thread and swapped in exactly
/// once when [`poll`](Self::poll) sees the result. A failed load keeps the
/// placeholder forever and only logs a warning.
pub(crate) struct CubeTexture {
    bind_group: wgpu::BindGroup,
    pending: Option<PendingLoad>,
}

struct PendingLoad {
    source: TextureSource,
    receiver: Receiver<Result<RgbaImage>>,
}

impl CubeTexture {
    /// Uploads the 1x1 placeholder so the first frame has something to bind.
    pub(crate) fn placeholder(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        interface: &ShaderInterface,
    ) -> Self {
        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some("placeholder cube texture"),
                size: wgpu::Extent3d {
                    width: 1,
                    height: 1,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: TEXTURE_FORMAT,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            TextureDataOrder::LayerMajor,
            &PLACEHOLDER_PIXEL,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("placeholder cube sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        let bind_group = create_bind_group(device, layout, interface, &view, &sampler);

        Self {
            bind_group,
            pending: None,
        }
    }

    /// Starts the fire-and-forget image load on a worker thread.
    pub(crate) fn begin_load(&mut self, source: TextureSource) {
        let (sender, receiver) = mpsc::channel();
        let worker_source = source.clone();
        thread::spawn(move || {
            let _ = sender.send(fetch_and_decode(&worker_source));
        });
        self.pending = Some(PendingLoad { source, receiver });
    }

    /// Checks the worker once per frame without blocking.
    ///
    /// The first successful result replaces the placeholder; everything else
    /// (decode failure, worker gone) just drops the pending load.
    pub(crate) fn poll(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        interface: &ShaderInterface,
    ) {
        let Some(pending) = self.pending.take() else {
            return;
        };

        match pending.receiver.try_recv() {
            Ok(Ok(image)) => {
                debug!(
                    source = %pending.source,
                    width = image.width(),
                    height = image.height(),
                    "cube texture loaded"
                );
                self.bind_group = upload_image(device, queue, layout, interface, &image);
            }
            Ok(Err(error)) => {
                warn!(
                    source = %pending.source,
                    error = %format!("{error:#}"),
                    "failed to load cube texture; keeping placeholder"
                );
            }
            Err(TryRecvError::Empty) => {
                self.pending = Some(pending);
            }
            Err(TryRecvError::Disconnected) => {
                warn!(
                    source = %pending.source,
                    "texture load worker exited without a result; keeping placeholder"
                );
            }
        }
    }

    pub(crate) fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}

fn create_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    interface: &ShaderInterface,
    view: &wgpu::TextureView,
    sampler: &wgpu::Sampler,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("cube texture bind group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: interface.texture_binding,
                resource: wgpu::BindingResource::TextureView(view),
            },
            wgpu::BindGroupEntry {
                binding: interface.sampler_binding,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    })
}

/// Uploads a decoded image, applying the power-of-two policy: mipmapped and
/// repeating when both dimensions are powers of two, a single clamped level
/// otherwise.
fn upload_image(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layout: &wgpu::BindGroupLayout,
    interface: &ShaderInterface,
    image: &RgbaImage,
) -> wgpu::BindGroup {
    let (width, height) = image.dimensions();
    let mipmapped = is_power_of_two(width) && is_power_of_two(height);

    let (levels, data) = if mipmapped {
        let chain = build_mip_chain(image);
        let mut data = Vec::new();
        for level in &chain {
            data.extend_from_slice(level.as_raw());
        }
        (chain.len() as u32, data)
    } else {
        (1, image.as_raw().clone())
    };

    let texture = device.create_texture_with_data(
        queue,
        &wgpu::TextureDescriptor {
            label: Some("cube texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: levels,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TEXTURE_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        },
        TextureDataOrder::MipMajor,
        &data,
    );
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

    let address_mode = if mipmapped {
        wgpu::AddressMode::Repeat
    } else {
        wgpu::AddressMode::ClampToEdge
    };
    let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("cube sampler"),
        address_mode_u: address_mode,
        address_mode_v: address_mode,
        address_mode_w: address_mode,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    });

    create_bind_group(device, layout, interface, &view, &sampler)
}

/// Reads and decodes the image on the worker thread. Blocking is fine here.
fn fetch_and_decode(source: &TextureSource) -> Result<RgbaImage> {
    let image = match source {
        TextureSource::Path(path) => image::open(path)
            .with_context(|| format!("failed to open texture at {}", path.display()))?,
        TextureSource::Url(url) => {
            let response = reqwest::blocking::get(url.as_str())
                .with_context(|| format!("failed to fetch texture from {url}"))?
                .error_for_status()
                .with_context(|| format!("texture request to {url} was rejected"))?;
            let bytes = response
                .bytes()
                .with_context(|| format!("failed to read texture body from {url}"))?;
            image::load_from_memory(&bytes)
                .with_context(|| format!("failed to decode texture from {url}"))?
        }
    };
    Ok(image.to_rgba8())
}

fn is_power_of_two(value: u32) -> bool {
    value != 0 && value & (value - 1) == 0
}

/// Full mip chain down to 1x1, level 0 included, triangle-filtered.
fn build_mip_chain(image: &RgbaImage) -> Vec<RgbaImage> {
    let mut chain = vec![image.clone()];
    let (mut width, mut height) = image.dimensions();
    while width > 1 || height > 1 {
        width = (width / 2).max(1);
        height = (height / 2).max(1);
        chain.push(image::imageops::resize(
            image,
            width,
            height,
            FilterType::Triangle,
        ));
    }
    chain
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_of_two_detection() {
        for value in [1u32, 2, 4, 64, 256, 1024] {
            assert!(is_power_of_two(value), "{value} is a power of two");
        }
        for value in [0u32, 3, 6, 100, 300, 255] {
            assert!(!is_power_of_two(value), "{value} is not a power of two");
        }
    }

    #[test]
    fn mip_chain_halves_down_to_one_pixel() {
        let image = RgbaImage::from_pixel(256, 256, image::Rgba([10, 20, 30, 255]));
        let chain = build_mip_chain(&image);
        assert_eq!(chain.len(), 9);
        assert_eq!(chain[0].dimensions(), (256, 256));
        assert_eq!(chain[1].dimensions(), (128, 128));
        assert_eq!(chain.last().unwrap().dimensions(), (1, 1));
    }

    #[test]
    fn mip_chain_of_a_single_pixel_is_just_that_pixel() {
        let image = RgbaImage::from_pixel(1, 1, image::Rgba([1, 2, 3, 4]));
        let chain = build_mip_chain(&image);
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn rectangular_chains_clamp_the_short_axis() {
        let image = RgbaImage::from_pixel(8, 2, image::Rgba([0, 0, 0, 255]));
        let chain = build_mip_chain(&image);
        let dimensions: Vec<_> = chain.iter().map(|level| level.dimensions()).collect();
        assert_eq!(dimensions, vec![(8, 2), (4, 1), (2, 1), (1, 1)]);
    }

    #[test]
    fn uniform_images_downsample_to_the_same_color() {
        let image = RgbaImage::from_pixel(16, 16, image::Rgba([40, 80, 120, 255]));
        let chain = build_mip_chain(&image);
        for level in &chain {
            for pixel in level.pixels() {
                assert_eq!(pixel.0, [40, 80, 120, 255]);
            }
        }
    }

    #[test]
    fn missing_file_reports_an_error_not_a_panic() {
        let source = TextureSource::Path("definitely/not/here.png".into());
        assert!(fetch_and_decode(&source).is_err());
    }
}
