pub const WHITE_BACKGROUND_PROMPT: &str = "Pure solid white background only, hex #FFFFFF. \
No gray, cream or beige. No shadows, gradients, floor or studio lighting effects. \
Keep the product exactly as it is with every detail preserved. \
The background must be uniform white like a cutout.";
