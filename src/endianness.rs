use std::io;
use std::io::{Read, Write};
use bytemuck::Pod;

#[cfg(target_endian = "little")]
pub const IS_LITTLE_ENDIAN: bool = true;

#[cfg(target_endian = "big")]
pub const IS_LITTLE_ENDIAN: bool = false;

pub const IS_BIG_ENDIAN: bool = !IS_LITTLE_ENDIAN;

/// A 7-bit encoded 32 bit integer never spans more than this many bytes.
pub const MAX_7BIT_ENCODED_LEN: usize = 5;

pub trait ReadExtensions: Read{
    #[inline]
    fn read_le_struct<T: Pod + SwapEndian>(&mut self) -> io::Result<T>{
        self.read_struct(IS_BIG_ENDIAN)
    }

    #[inline]
    fn read_struct<T: Pod + SwapEndian>(&mut self, swap_endian: bool) -> io::Result<T>{
        let mut data = T::zeroed();
        let bytes = bytemuck::bytes_of_mut(&mut data);

        self.read_exact(bytes)?;

        if swap_endian{
            data = data.swap_endian();
        }

        Ok(data)
    }

    /// Reads the variable length integer format where every byte carries 7 value bits and the
    /// high bit marks a continuation. Bit groups come least significant first.
    fn read_7bit_encoded_u32(&mut self) -> io::Result<u32>{
        let mut value: u32 = 0;

        for index in 0..MAX_7BIT_ENCODED_LEN{
            let byte: u8 = self.read_le_struct()?;

            // the fifth byte only has room for the top 4 bits of a u32
            if index == MAX_7BIT_ENCODED_LEN - 1 && byte > 0b1111{
                return Err(io::Error::new(io::ErrorKind::InvalidData, "7-bit encoded integer overflows 32 bits"));
            }

            value |= ((byte & 0x7F) as u32) << (7 * index);

            if byte & 0x80 == 0{
                return Ok(value);
            }
        }

        Err(io::Error::new(io::ErrorKind::InvalidData, "7-bit encoded integer is too long"))
    }
}

impl<T: Read + ?Sized> ReadExtensions for T{}

pub trait WriteExtensions: Write{
    #[inline]
    fn write_le_struct<T: Pod + SwapEndian>(&mut self, value: T) -> io::Result<()>{
        let value = if IS_BIG_ENDIAN { value.swap_endian() } else { value };

        self.write_all(bytemuck::bytes_of(&value))
    }

    fn write_7bit_encoded_u32(&mut self, mut value: u32) -> io::Result<()>{
        while value >= 0x80{
            self.write_all(&[(value as u8) | 0x80])?;
            value >>= 7;
        }

        self.write_all(&[value as u8])
    }
}

impl<T: Write + ?Sized> WriteExtensions for T{}

pub trait SwapEndian: Clone + Copy{
    fn swap_endian(self) -> Self;
}

impl SwapEndian for u8{
    #[inline]
    fn swap_endian(self) -> Self {
        self
    }
}

impl SwapEndian for i64{
    #[inline]
    fn swap_endian(self) -> Self {
        self.swap_bytes()
    }
}
