#[cfg(feature = "decoder")]
pub(crate) use decoder::CeltDecoder;
#[cfg(feature = "encoder")]
pub(crate) use encoder::CeltEncoder;

mod bands;
mod bitalloc;
mod comb_filter;
#[cfg(feature = "decoder")]
mod decoder;
#[cfg(feature = "encoder")]
mod encoder;
mod kiss_fft;
mod mdct;
pub(crate) mod mode;
mod pvq;
mod stereo;
mod tables;
